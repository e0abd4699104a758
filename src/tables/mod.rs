mod history;
mod ws;

use axum::{Router, routing::get};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::table_ws))
        .route("/{table_id}/history", get(history::history))
}
