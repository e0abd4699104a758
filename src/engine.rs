//! Persist-then-fan-out pipeline: an accepted action is appended to the log
//! first, then pushed to every live member of the table's room.

use std::sync::Arc;

use serde_json::Value;
use time::OffsetDateTime;
use time::macros::format_description;

use crate::directory;
use crate::error::AppResult;
use crate::events::ServerEvent;
use crate::registry::{RoomKey, RoomRegistry};
use crate::store::{Action, ActionStore};

#[derive(Clone)]
pub struct BroadcastEngine {
    store: ActionStore,
    rooms: Arc<RoomRegistry>,
}

impl BroadcastEngine {
    pub fn new(store: ActionStore, rooms: Arc<RoomRegistry>) -> Self {
        Self { store, rooms }
    }

    pub fn store(&self) -> &ActionStore {
        &self.store
    }

    /// Appends the action and broadcasts it to every member of the table's
    /// room, the submitter included. A validation or persistence failure
    /// aborts before any delivery; a failed delivery to one member never
    /// affects the others or the stored record.
    pub async fn submit_action(
        &self,
        table_id: i64,
        author_id: i64,
        action_type: &str,
        details: &Value,
    ) -> AppResult<Action> {
        let action = self.store.append(table_id, author_id, action_type, details).await?;
        let author_nickname = directory::user_nickname(self.store.pool(), author_id).await?;

        let event = ServerEvent::ReceiveAction {
            author_id,
            author_nickname,
            action_type: action.action_type.clone(),
            details: action.details.clone(),
            timestamp: clock_format(action.timestamp),
        };

        let room = RoomKey::for_table(table_id);
        let members = self.rooms.members_of(&room);
        tracing::debug!(%room, members = members.len(), seq = action.seq, "broadcasting action");
        for (conn_id, tx) in members {
            if tx.send(event.clone()).is_err() {
                tracing::warn!(%conn_id, %room, "dropping event for unreachable connection");
            }
        }

        Ok(action)
    }
}

fn clock_format(timestamp: OffsetDateTime) -> String {
    let clock = format_description!("[hour]:[minute]:[second]");
    timestamp.format(clock).unwrap_or_default()
}
