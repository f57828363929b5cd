//! SQLite checkpoint store.
//!
//! Implements `CheckpointStore` from `waypoint-core`. Each thread has one row
//! holding the full JSON snapshot; a save is a single-row upsert, so a reader
//! always sees one complete snapshot.

use chrono::{DateTime, Utc};
use sqlx::Row;
use waypoint_core::checkpoint::{CheckpointStore, decode_state, encode_state};
use waypoint_types::conversation::ConversationState;
use waypoint_types::error::CheckpointError;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `CheckpointStore`.
#[derive(Clone)]
pub struct SqliteCheckpointStore {
    pool: DatabasePool,
}

impl SqliteCheckpointStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Write raw text as a thread's snapshot without encoding it.
    pub async fn save_raw(&self, thread_id: &str, raw: &str) -> Result<(), CheckpointError> {
        upsert(&self.pool, thread_id, raw, &Utc::now()).await
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn storage_err(e: sqlx::Error) -> CheckpointError {
    CheckpointError::Storage(e.to_string())
}

async fn upsert(
    pool: &DatabasePool,
    thread_id: &str,
    state: &str,
    updated_at: &DateTime<Utc>,
) -> Result<(), CheckpointError> {
    sqlx::query(
        r#"INSERT INTO checkpoints (thread_id, state, updated_at)
           VALUES (?, ?, ?)
           ON CONFLICT (thread_id) DO UPDATE SET state = excluded.state, updated_at = excluded.updated_at"#,
    )
    .bind(thread_id)
    .bind(state)
    .bind(format_datetime(updated_at))
    .execute(&pool.writer)
    .await
    .map_err(storage_err)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// CheckpointStore implementation
// ---------------------------------------------------------------------------

impl CheckpointStore for SqliteCheckpointStore {
    async fn load(&self, thread_id: &str) -> Result<Option<ConversationState>, CheckpointError> {
        let row = sqlx::query("SELECT state FROM checkpoints WHERE thread_id = ?")
            .bind(thread_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(storage_err)?;

        match row {
            Some(row) => {
                let raw: String = row.try_get("state").map_err(storage_err)?;
                decode_state(thread_id, &raw).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn save(&self, state: &ConversationState) -> Result<(), CheckpointError> {
        let raw = encode_state(state)?;
        upsert(&self.pool, &state.thread_id, &raw, &state.updated_at).await?;
        tracing::debug!(thread_id = %state.thread_id, bytes = raw.len(), "checkpoint saved");
        Ok(())
    }

    async fn delete(&self, thread_id: &str) -> Result<bool, CheckpointError> {
        let result = sqlx::query("DELETE FROM checkpoints WHERE thread_id = ?")
            .bind(thread_id)
            .execute(&self.pool.writer)
            .await
            .map_err(storage_err)?;
        Ok(result.rows_affected() > 0)
    }
}
