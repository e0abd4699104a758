use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};

pub async fn user_nickname(db_pool: &SqlitePool, user_id: i64) -> AppResult<String> {
    let row: Option<(String,)> = sqlx::query_as("SELECT nickname FROM users WHERE id=?")
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?;

    match row {
        Some((nickname,)) => Ok(nickname),
        None => Err(AppError::NotFound { what: "user", id: user_id }),
    }
}

pub async fn table_name(db_pool: &SqlitePool, table_id: i64) -> AppResult<String> {
    let row: Option<(String,)> = sqlx::query_as("SELECT name FROM game_tables WHERE id=?")
        .bind(table_id)
        .fetch_optional(db_pool)
        .await?;

    match row {
        Some((name,)) => Ok(name),
        None => Err(AppError::NotFound { what: "table", id: table_id }),
    }
}
