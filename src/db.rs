use sqlx::SqlitePool;

use crate::error::AppResult;

// users:       id, nickname            (identity collaborator)
// game_tables: id, name, owner_id     (table collaborator)
// actions:     append-only log; seq is strictly increasing per table

pub async fn ensure_schema(db_pool: &SqlitePool) -> AppResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (\
            id INTEGER PRIMARY KEY, \
            nickname TEXT NOT NULL UNIQUE\
        )",
    )
    .execute(db_pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS game_tables (\
            id INTEGER PRIMARY KEY, \
            name TEXT NOT NULL, \
            owner_id INTEGER NOT NULL REFERENCES users(id)\
        )",
    )
    .execute(db_pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS actions (\
            id BLOB PRIMARY KEY, \
            table_id INTEGER NOT NULL REFERENCES game_tables(id), \
            author_id INTEGER NOT NULL REFERENCES users(id), \
            action_type TEXT NOT NULL, \
            details TEXT NOT NULL, \
            timestamp TEXT NOT NULL, \
            seq INTEGER NOT NULL\
        )",
    )
    .execute(db_pool)
    .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_actions_table_seq \
         ON actions(table_id, seq)",
    )
    .execute(db_pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_actions_table_time \
         ON actions(table_id, timestamp)",
    )
    .execute(db_pool)
    .await?;

    Ok(())
}

/// Example users and tables for trying the server out without an external
/// account system. Idempotent.
pub async fn seed_demo(db_pool: &SqlitePool) -> AppResult<()> {
    sqlx::query(
        "INSERT OR IGNORE INTO users (id, nickname) VALUES \
         (1, 'Mestre'), (2, 'Jogador1'), (3, 'Jogador2')",
    )
    .execute(db_pool)
    .await?;

    sqlx::query(
        "INSERT OR IGNORE INTO game_tables (id, name, owner_id) VALUES \
         (10, 'A Caverna do Dragão', 1), (11, 'Floresta Sombria', 1)",
    )
    .execute(db_pool)
    .await?;

    Ok(())
}
