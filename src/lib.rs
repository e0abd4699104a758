pub mod db;
pub mod directory;
pub mod engine;
pub mod error;
pub mod events;
pub mod registry;
pub mod store;
pub mod tables;

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::engine::BroadcastEngine;
use crate::registry::RoomRegistry;
use crate::store::ActionStore;

pub use crate::error::{AppError, AppResult};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub store: ActionStore,
    pub rooms: Arc<RoomRegistry>,
    pub engine: BroadcastEngine,
}

impl AppState {
    pub fn new(db_pool: SqlitePool) -> Self {
        let store = ActionStore::new(db_pool.clone());
        let rooms = Arc::new(RoomRegistry::new());
        let engine = BroadcastEngine::new(store.clone(), rooms.clone());

        AppState { db_pool, store, rooms, engine }
    }
}
