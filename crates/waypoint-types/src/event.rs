//! Turn input and the events a turn produces.

use serde::{Deserialize, Serialize};

use crate::plan::Step;

/// Per-turn switches supplied by the client.
///
/// Not sticky: a missing value is treated as `false` for this turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnFlags {
    pub should_execute: Option<bool>,
    pub has_optimal_path: Option<bool>,
}

/// One user turn against a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnInput {
    pub thread_id: String,
    pub message: String,
    #[serde(default)]
    pub flags: TurnFlags,
}

impl TurnInput {
    pub fn new(thread_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            message: message.into(),
            flags: TurnFlags::default(),
        }
    }

    pub fn with_flags(mut self, flags: TurnFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Events emitted by the engine while a turn runs, in the order they occur.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Conversational assistant reply; the turn is suspended awaiting input.
    Reply { content: String },

    /// A task was finalized and a plan parsed from the planner's output.
    PlanReady {
        task: String,
        plan_text: String,
        steps: Vec<Step>,
    },

    /// Every step ran; `optimal_path` is the last step's result.
    Completed {
        task: String,
        summary: String,
        optimal_path: String,
        execute: bool,
    },

    /// The current task was abandoned.
    TaskFailed { kind: String, message: String },
}
