//! Durable, ordered, append-only log of table actions. Records are never
//! updated or deleted once written.

use serde::Serialize;
use serde_json::Value;
use sqlx::SqlitePool;
use sqlx::types::Json;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::directory;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Action {
    pub id: Uuid,
    pub table_id: i64,
    pub author_id: i64,
    pub action_type: String,
    pub details: Value,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub seq: i64,
}

#[derive(Clone)]
pub struct ActionStore {
    db_pool: SqlitePool,
}

impl ActionStore {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db_pool
    }

    /// Validates, stamps and persists one action, returning the stored record
    /// with its generated id, timestamp and per-table sequence position.
    pub async fn append(
        &self,
        table_id: i64,
        author_id: i64,
        action_type: &str,
        details: &Value,
    ) -> AppResult<Action> {
        if action_type.trim().is_empty() {
            return Err(AppError::InvalidArgument("action_type"));
        }
        if details_is_empty(details) {
            return Err(AppError::InvalidArgument("details"));
        }
        directory::table_name(&self.db_pool, table_id).await?;
        directory::user_nickname(&self.db_pool, author_id).await?;

        let id = Uuid::now_v7();
        let timestamp = OffsetDateTime::now_utc();

        // SQLite runs one writer at a time, so reading MAX(seq) and inserting
        // in the same statement keeps the sequence gap-free under concurrent
        // submissions.
        sqlx::query(
            "INSERT INTO actions (id, table_id, author_id, action_type, details, timestamp, seq) \
             SELECT ?, ?, ?, ?, ?, ?, COALESCE(MAX(seq), 0) + 1 FROM actions WHERE table_id=?",
        )
        .bind(id)
        .bind(table_id)
        .bind(author_id)
        .bind(action_type)
        .bind(Json(details))
        .bind(timestamp)
        .bind(table_id)
        .execute(&self.db_pool)
        .await?;

        let (seq,): (i64,) = sqlx::query_as("SELECT seq FROM actions WHERE id=?")
            .bind(id)
            .fetch_one(&self.db_pool)
            .await?;

        Ok(Action {
            id,
            table_id,
            author_id,
            action_type: action_type.to_owned(),
            details: details.clone(),
            timestamp,
            seq,
        })
    }

    /// Every action ever posted to the table, oldest first. Each call re-reads
    /// current state; this is not a live subscription.
    pub async fn history(&self, table_id: i64) -> AppResult<Vec<Action>> {
        directory::table_name(&self.db_pool, table_id).await?;

        let rows: Vec<(Uuid, i64, String, Json<Value>, OffsetDateTime, i64)> = sqlx::query_as(
            "SELECT id, author_id, action_type, details, timestamp, seq \
             FROM actions WHERE table_id=? ORDER BY timestamp ASC, seq ASC",
        )
        .bind(table_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, author_id, action_type, details, timestamp, seq)| Action {
                id,
                table_id,
                author_id,
                action_type,
                details: details.0,
                timestamp,
                seq,
            })
            .collect())
    }
}

pub(crate) fn details_is_empty(details: &Value) -> bool {
    match details {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn seeded_store() -> ActionStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        db::ensure_schema(&pool).await.unwrap();
        db::seed_demo(&pool).await.unwrap();
        ActionStore::new(pool)
    }

    #[tokio::test]
    async fn append_assigns_increasing_sequence() {
        let store = seeded_store().await;

        let first = store.append(10, 1, "chat", &json!({"message": "a"})).await.unwrap();
        let second = store.append(10, 2, "chat", &json!({"message": "b"})).await.unwrap();
        let third = store.append(10, 1, "dice_roll", &json!({"dice": "1d20", "result": 15})).await.unwrap();

        assert_eq!(first.seq, 1);
        assert_eq!(second.seq, 2);
        assert_eq!(third.seq, 3);
    }

    #[tokio::test]
    async fn sequences_are_independent_per_table() {
        let store = seeded_store().await;

        store.append(10, 1, "chat", &json!({"message": "a"})).await.unwrap();
        store.append(10, 1, "chat", &json!({"message": "b"})).await.unwrap();
        let other = store.append(11, 1, "chat", &json!({"message": "c"})).await.unwrap();

        assert_eq!(other.seq, 1);
    }

    #[tokio::test]
    async fn append_rejects_unknown_table_and_author() {
        let store = seeded_store().await;

        assert!(matches!(
            store.append(99, 1, "chat", &json!({"message": "a"})).await,
            Err(AppError::NotFound { what: "table", id: 99 })
        ));
        assert!(matches!(
            store.append(10, 99, "chat", &json!({"message": "a"})).await,
            Err(AppError::NotFound { what: "user", id: 99 })
        ));
        assert!(store.history(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_rejects_blank_fields() {
        let store = seeded_store().await;

        assert!(matches!(
            store.append(10, 1, "  ", &json!({"message": "a"})).await,
            Err(AppError::InvalidArgument("action_type"))
        ));
        assert!(matches!(
            store.append(10, 1, "chat", &json!({})).await,
            Err(AppError::InvalidArgument("details"))
        ));
        assert!(matches!(
            store.append(10, 1, "chat", &Value::Null).await,
            Err(AppError::InvalidArgument("details"))
        ));
    }

    #[tokio::test]
    async fn history_returns_actions_in_append_order() {
        let store = seeded_store().await;

        let mut appended = Vec::new();
        for n in 0..5 {
            appended.push(
                store
                    .append(10, 1 + n % 2, "chat", &json!({"message": n.to_string()}))
                    .await
                    .unwrap(),
            );
        }
        store.append(11, 3, "status_change", &json!({"status": "afk"})).await.unwrap();

        let history = store.history(10).await.unwrap();
        assert_eq!(history, appended);
    }

    #[tokio::test]
    async fn history_of_unknown_table_is_not_found() {
        let store = seeded_store().await;
        assert!(matches!(
            store.history(99).await,
            Err(AppError::NotFound { what: "table", id: 99 })
        ));
    }

    #[test]
    fn empty_details_shapes() {
        assert!(details_is_empty(&Value::Null));
        assert!(details_is_empty(&json!("")));
        assert!(details_is_empty(&json!({})));
        assert!(details_is_empty(&json!([])));
        assert!(!details_is_empty(&json!({"message": "hi"})));
        assert!(!details_is_empty(&json!(0)));
    }
}
