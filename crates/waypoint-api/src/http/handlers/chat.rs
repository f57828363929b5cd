//! SSE streaming chat endpoint.
//!
//! POST /api/chat
//!
//! Runs one turn on its own task and streams the engine's events as they
//! happen. A client that disconnects stops receiving frames; the turn still
//! runs to completion and persists.

use std::convert::Infallible;

use axum::Json;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::Stream;

use waypoint_core::checkpoint::CheckpointStore;
use waypoint_core::llm::TextCompletion;
use waypoint_core::routing::RoutingCapability;
use waypoint_types::event::{TurnFlags, TurnInput};

use crate::http::error::AppError;
use crate::http::frames::{error_frame, event_frame, turn_error_body};
use crate::state::AppState;

/// One entry of the client's message list.
#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: String,
    pub content: String,
}

/// Request body for the streaming chat endpoint.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub thread_id: String,
    #[serde(default)]
    pub should_execute: Option<bool>,
    #[serde(default)]
    pub has_optimal_path: Option<bool>,
}

impl ChatRequest {
    /// The last message is the new user turn; earlier entries are the
    /// client's copy of the history and are not replayed.
    pub fn into_turn_input(self) -> Result<TurnInput, AppError> {
        if self.thread_id.trim().is_empty() {
            return Err(AppError::Validation("thread_id must not be empty".into()));
        }
        let last = self
            .messages
            .into_iter()
            .last()
            .ok_or_else(|| AppError::Validation("messages must not be empty".into()))?;

        tracing::debug!(thread_id = %self.thread_id, role = %last.role, "chat turn received");

        Ok(TurnInput::new(self.thread_id, last.content).with_flags(TurnFlags {
            should_execute: self.should_execute,
            has_optimal_path: self.has_optimal_path,
        }))
    }
}

/// POST /api/chat - run one turn and stream its frames.
pub async fn stream_chat<S, L, R>(
    State(state): State<AppState<S, L, R>>,
    Json(body): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError>
where
    S: CheckpointStore + 'static,
    L: TextCompletion + 'static,
    R: RoutingCapability + 'static,
{
    let input = body.into_turn_input()?;
    let thread_id = input.thread_id.clone();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let engine = state.engine.clone();
    let turn = tokio::spawn(async move { engine.run_turn(input, &tx).await });

    let sse_stream = async_stream::stream! {
        while let Some(event) = rx.recv().await {
            yield Ok::<_, Infallible>(event_frame(&event));
        }

        match turn.await {
            Ok(Ok(outcome)) => {
                tracing::debug!(thread_id = %thread_id, status = ?outcome.status, "chat turn finished");
            }
            Ok(Err(err)) => {
                tracing::error!(thread_id = %thread_id, error = %err, "chat turn failed");
                yield Ok(error_frame(&turn_error_body(&err)));
            }
            Err(join_err) => {
                tracing::error!(thread_id = %thread_id, error = %join_err, "chat turn task aborted");
                let body = serde_json::json!({ "error": "internal", "message": join_err.to_string() });
                yield Ok(error_frame(&body));
            }
        }
    };

    Ok(Sse::new(sse_stream).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> ChatRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn last_message_is_the_turn() {
        let input = request(
            r#"{"thread_id":"t1","messages":[
                {"role":"user","content":"hi"},
                {"role":"assistant","content":"hello"},
                {"role":"user","content":"swap 100 USDC"}
            ],"should_execute":true}"#,
        )
        .into_turn_input()
        .unwrap();

        assert_eq!(input.thread_id, "t1");
        assert_eq!(input.message, "swap 100 USDC");
        assert_eq!(input.flags.should_execute, Some(true));
        assert_eq!(input.flags.has_optimal_path, None);
    }

    #[test]
    fn empty_messages_are_rejected() {
        let err = request(r#"{"thread_id":"t1","messages":[]}"#)
            .into_turn_input()
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn blank_thread_id_is_rejected() {
        let err = request(r#"{"thread_id":"  ","messages":[{"role":"user","content":"hi"}]}"#)
            .into_turn_input()
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
