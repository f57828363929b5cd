//! Conversation stage: one model reply per turn, optionally handing over a
//! finalized task.
//!
//! The model hands over a task only inside a `<task_ready>...</task_ready>`
//! wrapper. Text outside the wrapper is the user-visible reply; JSON-looking
//! text anywhere else is never parsed. A hand-over is accepted only when the
//! latest user message contains the confirmation token as a whole word.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use waypoint_types::conversation::ConversationState;
use waypoint_types::error::TaskError;

use crate::llm::TextCompletion;
use crate::prompts::{CONFIRMATION_TOKEN, TASK_READY_CLOSE, TASK_READY_OPEN, conversation_prompt};

static CONFIRMATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bconfirm\b").expect("confirmation regex is valid"));

/// Reply used when the model returns nothing usable.
pub const FALLBACK_REPLY: &str = "Sorry, I didn't catch that. Could you rephrase your request?";

/// Result of one conversation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConverseOutcome {
    /// Keep talking; the turn suspends after this reply.
    Conversational { reply: String },
    /// The user confirmed a complete task; planning may start.
    Finalized { task: String, reply: String },
}

impl ConverseOutcome {
    pub fn reply(&self) -> &str {
        match self {
            ConverseOutcome::Conversational { reply } | ConverseOutcome::Finalized { reply, .. } => {
                reply
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct TaskReadyPayload {
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    task: String,
}

/// True when `message` contains the confirmation token as a whole word.
pub fn has_confirmation(message: &str) -> bool {
    CONFIRMATION.is_match(message)
}

/// Split a raw model reply into its visible text and the sentinel body, if any.
///
/// Only the first well-formed wrapper is recognized. An opening tag without a
/// closing tag is left in the visible text.
pub fn split_sentinel(raw: &str) -> (String, Option<String>) {
    let Some(open) = raw.find(TASK_READY_OPEN) else {
        return (raw.trim().to_string(), None);
    };
    let body_start = open + TASK_READY_OPEN.len();
    let Some(close_rel) = raw[body_start..].find(TASK_READY_CLOSE) else {
        return (raw.trim().to_string(), None);
    };
    let body_end = body_start + close_rel;
    let after = body_end + TASK_READY_CLOSE.len();

    let mut visible = String::with_capacity(raw.len());
    visible.push_str(raw[..open].trim_end());
    let tail = raw[after..].trim_start();
    if !visible.is_empty() && !tail.is_empty() {
        visible.push('\n');
    }
    visible.push_str(tail);

    let body = strip_code_fence(raw[body_start..body_end].trim());
    (visible.trim().to_string(), Some(body.to_string()))
}

fn strip_code_fence(body: &str) -> &str {
    let Some(inner) = body.strip_prefix("```") else {
        return body;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Decide the outcome of a model reply given the latest user message.
pub fn interpret_reply(raw: &str, latest_user: &str) -> ConverseOutcome {
    let (visible, body) = split_sentinel(raw);

    let payload = body.and_then(|b| match serde_json::from_str::<TaskReadyPayload>(&b) {
        Ok(p) if p.ready && !p.task.trim().is_empty() => Some(p),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring malformed task_ready payload");
            None
        }
    });

    match payload {
        Some(p) if has_confirmation(latest_user) => {
            let task = p.task.trim().to_string();
            let reply = if visible.is_empty() {
                format!("Task confirmed: {task}")
            } else {
                visible
            };
            ConverseOutcome::Finalized { task, reply }
        }
        Some(p) => {
            tracing::debug!(task = %p.task, "task handed over without user confirmation");
            let ask = format!(
                "Please reply {CONFIRMATION_TOKEN} to proceed with: {}",
                p.task.trim()
            );
            let reply = if visible.is_empty() {
                ask
            } else {
                format!("{visible}\n\n{ask}")
            };
            ConverseOutcome::Conversational { reply }
        }
        None if visible.is_empty() => ConverseOutcome::Conversational {
            reply: FALLBACK_REPLY.to_string(),
        },
        None => ConverseOutcome::Conversational { reply: visible },
    }
}

/// Run the conversation stage over the thread's full history.
pub async fn converse<L: TextCompletion>(
    llm: &L,
    state: &ConversationState,
) -> Result<ConverseOutcome, TaskError> {
    let prompt = conversation_prompt(state);
    let raw = llm.complete(&prompt, &state.messages).await?;
    Ok(interpret_reply(
        &raw,
        state.latest_user_message().unwrap_or_default(),
    ))
}
