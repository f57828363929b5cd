//! Checkpoint store port and an in-memory implementation.
//!
//! A checkpoint is the full JSON snapshot of a thread's `ConversationState`.
//! Stores persist the encoded text as-is; decoding always goes through
//! [`decode_state`] so every backend reports unreadable snapshots the same way.

use dashmap::DashMap;
use waypoint_types::conversation::ConversationState;
use waypoint_types::error::CheckpointError;

/// Durable key-value mapping from thread id to the latest state snapshot.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait CheckpointStore: Send + Sync {
    /// Load the latest snapshot for a thread.
    ///
    /// `Ok(None)` means the thread has never been saved. A stored snapshot
    /// that cannot be decoded is `Err(CheckpointError::Decode)`, never `None`.
    fn load(
        &self,
        thread_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<ConversationState>, CheckpointError>> + Send;

    /// Replace the snapshot for `state.thread_id` (last writer wins).
    fn save(
        &self,
        state: &ConversationState,
    ) -> impl std::future::Future<Output = Result<(), CheckpointError>> + Send;

    /// Remove a thread's snapshot. Returns `true` if it existed.
    fn delete(
        &self,
        thread_id: &str,
    ) -> impl std::future::Future<Output = Result<bool, CheckpointError>> + Send;
}

/// Serialize a state snapshot to its stored JSON form.
pub fn encode_state(state: &ConversationState) -> Result<String, CheckpointError> {
    serde_json::to_string(state).map_err(|e| CheckpointError::Storage(e.to_string()))
}

/// Decode a stored snapshot, attributing failures to `thread_id`.
pub fn decode_state(thread_id: &str, raw: &str) -> Result<ConversationState, CheckpointError> {
    serde_json::from_str(raw).map_err(|e| CheckpointError::Decode {
        thread_id: thread_id.to_string(),
        message: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Process-local checkpoint store.
///
/// Snapshots are kept encoded so a load exercises the same decode path as the
/// SQLite store.
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    snapshots: DashMap<String, String>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw text under a thread id, bypassing encoding.
    pub fn insert_raw(&self, thread_id: impl Into<String>, raw: impl Into<String>) {
        self.snapshots.insert(thread_id.into(), raw.into());
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    async fn load(&self, thread_id: &str) -> Result<Option<ConversationState>, CheckpointError> {
        let raw = match self.snapshots.get(thread_id) {
            Some(entry) => entry.value().clone(),
            None => return Ok(None),
        };
        decode_state(thread_id, &raw).map(Some)
    }

    async fn save(&self, state: &ConversationState) -> Result<(), CheckpointError> {
        let raw = encode_state(state)?;
        self.snapshots.insert(state.thread_id.clone(), raw);
        Ok(())
    }

    async fn delete(&self, thread_id: &str) -> Result<bool, CheckpointError> {
        Ok(self.snapshots.remove(thread_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_types::conversation::{Message, StepResult};

    #[tokio::test]
    async fn load_missing_thread_is_none() {
        let store = MemoryCheckpointStore::new();
        assert!(store.load("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load_roundtrips_exactly() {
        let store = MemoryCheckpointStore::new();
        let mut state = ConversationState::new("t1");
        state.messages.push(Message::user("swap please"));
        state.messages.push(Message::assistant("which chain?"));
        state.results.push(StepResult {
            step_id: "#E1".into(),
            value: "v".into(),
        });

        store.save(&state).await.unwrap();
        let loaded = store.load("t1").await.unwrap().unwrap();
        assert_eq!(loaded, state);

        // Saving the loaded state again is a no-op in content.
        store.save(&loaded).await.unwrap();
        assert_eq!(store.load("t1").await.unwrap().unwrap(), state);
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_decode_error() {
        let store = MemoryCheckpointStore::new();
        store.insert_raw("bad", "{not json");
        let err = store.load("bad").await.unwrap_err();
        assert!(matches!(err, CheckpointError::Decode { ref thread_id, .. } if thread_id == "bad"));
    }

    #[tokio::test]
    async fn delete_reports_existence() {
        let store = MemoryCheckpointStore::new();
        store.save(&ConversationState::new("t")).await.unwrap();
        assert!(store.delete("t").await.unwrap());
        assert!(!store.delete("t").await.unwrap());
        assert!(store.is_empty());
    }
}
