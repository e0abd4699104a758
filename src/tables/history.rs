use axum::{Json, debug_handler, extract::{Path, State}};

use crate::error::AppResult;
use crate::store::{Action, ActionStore};

/// Full ordered history for a table, read once on page load before the
/// real-time channel takes over.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn history(
    Path(table_id): Path<i64>,
    State(store): State<ActionStore>,
) -> AppResult<Json<Vec<Action>>> {
    Ok(Json(store.history(table_id).await?))
}
