//! Conversation state: the unit of checkpoint persistence.
//!
//! One `ConversationState` exists per thread. It carries the append-only
//! message log plus every task-scoped field the workflow graph reads and
//! writes. All fields have a fixed type and a defined default, so a stored
//! snapshot never distinguishes "missing" from "false".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::plan::Step;

/// Who authored a message in the conversation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" | "human" => Ok(Role::User),
            "assistant" | "ai" => Ok(Role::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single entry in a thread's message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The recorded outcome of one executed plan step.
///
/// Stored as an ordered list on the state so that insertion order (which is
/// execution order) survives serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: String,
    pub value: String,
}

/// Per-thread workflow state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub thread_id: String,
    /// Chronological, append-only.
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub task_ready: bool,
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub plan_text: Option<String>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub results: Vec<StepResult>,
    #[serde(default)]
    pub should_execute: bool,
    #[serde(default)]
    pub has_optimal_path: bool,
    #[serde(default)]
    pub optimal_path: Option<String>,
    #[serde(default)]
    pub chain_finished: bool,
    /// Snapshots written without a timestamp load as "now".
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl ConversationState {
    /// Fresh state for a thread seen for the first time.
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            messages: Vec::new(),
            task_ready: false,
            task: None,
            plan_text: None,
            steps: Vec::new(),
            results: Vec::new(),
            should_execute: false,
            has_optimal_path: false,
            optimal_path: None,
            chain_finished: false,
            updated_at: Utc::now(),
        }
    }

    /// The step that should run next, if any remain.
    ///
    /// Step *k* is only eligible once steps `1..k-1` have results, so the
    /// next step is always the one at index `results.len()`.
    pub fn next_step(&self) -> Option<&Step> {
        self.steps.get(self.results.len())
    }

    /// True once every planned step has a recorded result.
    pub fn plan_complete(&self) -> bool {
        self.results.len() >= self.steps.len()
    }

    /// The most recent user message, if any.
    pub fn latest_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// True when no task-scoped field is set.
    pub fn is_task_idle(&self) -> bool {
        self.task.is_none()
            && self.plan_text.is_none()
            && self.steps.is_empty()
            && self.results.is_empty()
            && self.optimal_path.is_none()
    }

    /// Clear every task-scoped field, returning the thread to its pre-plan shape.
    ///
    /// The message log and `chain_finished` marker are left untouched; callers
    /// decide whether the task finished or was abandoned.
    pub fn reset_task(&mut self) {
        self.task_ready = false;
        self.task = None;
        self.plan_text = None;
        self.steps.clear();
        self.results.clear();
        self.should_execute = false;
        self.has_optimal_path = false;
        self.optimal_path = None;
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
