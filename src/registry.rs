//! Live room membership: which connections are in which room right now.
//! Nothing here is persisted.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::events::ServerEvent;

pub type ConnectionId = Uuid;
pub type OutboundSender = mpsc::UnboundedSender<ServerEvent>;
pub type OutboundReceiver = mpsc::UnboundedReceiver<ServerEvent>;

/// A table id maps to exactly one room key, stable for the table's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomKey(String);

impl RoomKey {
    pub fn for_table(table_id: i64) -> Self {
        RoomKey(format!("table_{table_id}"))
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Default)]
struct Room {
    members: RwLock<HashSet<ConnectionId>>,
}

/// Membership map shared by every connection task. Each room carries its own
/// lock, so join/leave/fan-out on different rooms never wait on each other.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    connections: RwLock<HashMap<ConnectionId, OutboundSender>>,
    rooms: RwLock<HashMap<RoomKey, Arc<Room>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new live connection and hands back the receiving half of
    /// its outbound queue.
    pub fn connect(&self) -> (ConnectionId, OutboundReceiver) {
        let conn_id = Uuid::now_v7();
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut connections) = self.connections.write() {
            connections.insert(conn_id, tx);
        }
        (conn_id, rx)
    }

    /// Idempotent: joining a room the connection is already in is a no-op.
    pub fn join(&self, conn_id: ConnectionId, room: &RoomKey) {
        let Some(room) = self.room_or_create(room) else {
            return;
        };
        if let Ok(mut members) = room.members.write() {
            members.insert(conn_id);
        }
    }

    /// Idempotent: leaving a room the connection is not in is a no-op.
    pub fn leave(&self, conn_id: ConnectionId, room: &RoomKey) {
        let Some(room) = self.room(room) else {
            return;
        };
        if let Ok(mut members) = room.members.write() {
            members.remove(&conn_id);
        }
    }

    /// Removes the connection from every room it belongs to. Safe to call for
    /// a connection that never joined anything.
    pub fn drop_connection(&self, conn_id: ConnectionId) {
        if let Ok(mut connections) = self.connections.write() {
            connections.remove(&conn_id);
        }

        let rooms: Vec<Arc<Room>> = self
            .rooms
            .read()
            .map(|rooms| rooms.values().cloned().collect())
            .unwrap_or_default();
        for room in rooms {
            if let Ok(mut members) = room.members.write() {
                members.remove(&conn_id);
            }
        }
    }

    /// Snapshot of the room's current members with their outbound senders.
    /// Members whose connection is already gone are skipped.
    pub fn members_of(&self, room: &RoomKey) -> Vec<(ConnectionId, OutboundSender)> {
        let Some(room) = self.room(room) else {
            return Vec::new();
        };
        let member_ids: Vec<ConnectionId> = room
            .members
            .read()
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default();

        let Ok(connections) = self.connections.read() else {
            return Vec::new();
        };
        member_ids
            .into_iter()
            .filter_map(|id| connections.get(&id).map(|tx| (id, tx.clone())))
            .collect()
    }

    /// Best-effort delivery to a single connection, used to report a failed
    /// submission to the submitter only.
    pub fn send_to(&self, conn_id: ConnectionId, event: ServerEvent) -> bool {
        let sender = self
            .connections
            .read()
            .ok()
            .and_then(|connections| connections.get(&conn_id).cloned());
        match sender {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    fn room(&self, key: &RoomKey) -> Option<Arc<Room>> {
        self.rooms.read().ok()?.get(key).cloned()
    }

    fn room_or_create(&self, key: &RoomKey) -> Option<Arc<Room>> {
        let mut rooms = self.rooms.write().ok()?;
        Some(rooms.entry(key.clone()).or_default().clone())
    }
}
