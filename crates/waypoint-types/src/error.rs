//! Error types shared by the engine and its adapters.

use thiserror::Error;

/// A task-level failure: the current task is abandoned and the thread is
/// returned to an idle state. The conversation itself survives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("could not parse plan: {0}")]
    Parse(String),

    #[error("invalid step arguments: {0}")]
    Validation(String),

    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("routing request failed: {0}")]
    Transport(String),

    #[error("language model call failed: {0}")]
    Completion(String),
}

impl TaskError {
    /// Stable snake_case code used on the wire and in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TaskError::Parse(_) => "parse_error",
            TaskError::Validation(_) => "validation_error",
            TaskError::UnknownTool(_) => "unknown_tool",
            TaskError::Transport(_) => "transport_error",
            TaskError::Completion(_) => "completion_error",
        }
    }
}

/// Errors from the checkpoint store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckpointError {
    /// The stored snapshot exists but cannot be decoded. Surfaced to the
    /// caller rather than silently replaced with a fresh state.
    #[error("checkpoint for thread '{thread_id}' is unreadable: {message}")]
    Decode { thread_id: String, message: String },

    #[error("checkpoint storage error: {0}")]
    Storage(String),
}

/// Errors from a text completion provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("provider returned an empty response")]
    EmptyResponse,

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("rate limited")]
    RateLimited,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("stream error: {0}")]
    Stream(String),
}

/// Errors from the routing capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("routing service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("routing request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("could not decode routing response: {0}")]
    Decode(String),
}

impl From<LlmError> for TaskError {
    fn from(err: LlmError) -> Self {
        TaskError::Completion(err.to_string())
    }
}

impl From<RoutingError> for TaskError {
    fn from(err: RoutingError) -> Self {
        TaskError::Transport(err.to_string())
    }
}
