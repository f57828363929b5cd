//! Planner stage: finalized task -> raw plan text.

use waypoint_types::conversation::Message;
use waypoint_types::error::TaskError;

use crate::llm::TextCompletion;
use crate::prompts::planner_prompt;

/// Ask the model for a plan. The text is parsed separately so the raw output
/// can be stored on the state even when it fails to parse.
pub async fn draft_plan<L: TextCompletion>(
    llm: &L,
    task: &str,
    max_steps: usize,
) -> Result<String, TaskError> {
    let history = [Message::user(task)];
    let text = llm.complete(&planner_prompt(max_steps), &history).await?;
    tracing::debug!(chars = text.len(), "planner returned");
    Ok(text)
}
