//! Wire frames for the chat stream.
//!
//! Each engine event becomes one SSE `data:` frame. Checkpoint failures use a
//! separate `error` event name so clients can tell them from task failures.

use axum::response::sse::Event;
use serde::Serialize;
use waypoint_core::workflow::engine::{EngineError, plan_summary};
use waypoint_types::conversation::Role;
use waypoint_types::error::CheckpointError;
use waypoint_types::event::EngineEvent;

/// JSON body of one chat stream frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChatFrame {
    /// Completed plan when the caller did not authorize execution.
    PathFound {
        content: String,
        role: Role,
        execute_path: String,
    },
    /// Completed plan handed to the caller for execution.
    Execute {
        #[serde(rename = "isExecute")]
        is_execute: bool,
        #[serde(rename = "executePath")]
        execute_path: String,
    },
    /// Task abandoned; `error` is the stable failure kind.
    Failed {
        content: String,
        role: Role,
        error: String,
    },
    /// Plain chat message.
    Message { content: String, role: Role },
}

impl ChatFrame {
    fn assistant(content: String) -> Self {
        ChatFrame::Message {
            content,
            role: Role::Assistant,
        }
    }
}

impl From<&EngineEvent> for ChatFrame {
    fn from(event: &EngineEvent) -> Self {
        match event {
            EngineEvent::Reply { content } => ChatFrame::assistant(content.clone()),
            EngineEvent::PlanReady { task, steps, .. } => {
                ChatFrame::assistant(plan_summary(task, steps))
            }
            EngineEvent::Completed {
                summary,
                optimal_path,
                execute: false,
                ..
            } => ChatFrame::PathFound {
                content: summary.clone(),
                role: Role::Assistant,
                execute_path: optimal_path.clone(),
            },
            EngineEvent::Completed {
                optimal_path,
                execute: true,
                ..
            } => ChatFrame::Execute {
                is_execute: true,
                execute_path: optimal_path.clone(),
            },
            EngineEvent::TaskFailed { kind, message } => ChatFrame::Failed {
                content: message.clone(),
                role: Role::Assistant,
                error: kind.clone(),
            },
        }
    }
}

/// SSE event carrying an engine event.
pub fn event_frame(event: &EngineEvent) -> Event {
    let frame = ChatFrame::from(event);
    let data = serde_json::to_string(&frame).unwrap_or_else(|_| "{}".to_string());
    Event::default().data(data)
}

/// Body of an `error` event for a failed turn.
pub fn turn_error_body(err: &EngineError) -> serde_json::Value {
    let EngineError::Checkpoint(inner) = err;
    let code = match inner {
        CheckpointError::Decode { .. } => "checkpoint_decode",
        CheckpointError::Storage(_) => "checkpoint_storage",
    };
    serde_json::json!({ "error": code, "message": inner.to_string() })
}

/// SSE `error` event for a turn that failed outside the task.
pub fn error_frame(body: &serde_json::Value) -> Event {
    Event::default().event("error").data(body.to_string())
}
