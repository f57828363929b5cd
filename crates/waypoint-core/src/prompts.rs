//! System prompts for the conversation and planner stages.

use waypoint_types::conversation::ConversationState;
use waypoint_types::plan::{Chain, Token, ToolName};

/// Opening tag of the task hand-over sentinel.
pub const TASK_READY_OPEN: &str = "<task_ready>";
/// Closing tag of the task hand-over sentinel.
pub const TASK_READY_CLOSE: &str = "</task_ready>";
/// Literal the user must type to authorize a task.
pub const CONFIRMATION_TOKEN: &str = "CONFIRM";

fn joined<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Prompt for the conversation stage, with the thread's current flags.
pub fn conversation_prompt(state: &ConversationState) -> String {
    format!(
        "You are a routing assistant that helps users move tokens between addresses and chains.\n\
         \n\
         Collect these fields from the user: source token, source address, destination token, \
         destination address, source chain, destination chain, amount.\n\
         Supported tokens: {tokens}. Supported chains: {chains}.\n\
         \n\
         Once every field is known, summarize the request and ask the user to reply with \
         {confirm} to proceed. Only after the user has replied {confirm}, end your reply with\n\
         {open}{{\"ready\": true, \"task\": \"<one-sentence task with every field>\"}}{close}\n\
         Never emit that tag otherwise.\n\
         \n\
         Current state: should_execute={should_execute}, has_optimal_path={has_optimal_path}.",
        tokens = joined(&Token::ALL),
        chains = joined(&Chain::ALL),
        confirm = CONFIRMATION_TOKEN,
        open = TASK_READY_OPEN,
        close = TASK_READY_CLOSE,
        should_execute = state.should_execute,
        has_optimal_path = state.has_optimal_path,
    )
}

/// Prompt for the planner stage, announcing the parser's step cap.
pub fn planner_prompt(max_steps: usize) -> String {
    format!(
        "Break the user's token-movement task into sequential steps.\n\
         For each step write a description line starting with \"Plan:\" followed by one line\n\
         #E<n> = <tool>[fromToken, senderAddress, toToken, receiverAddress, fromChain, toChain, amount]\n\
         Tools: {cross} (between chains), {other} (same chain, different receiver), \
         {this} (same chain, same receiver).\n\
         A later step may use #E<n> in place of a field to reference an earlier result.\n\
         Use at most {max_steps} steps and no other tools.",
        cross = ToolName::CrossChain.planner_name(),
        other = ToolName::SameChainOther.planner_name(),
        this = ToolName::SameChainSelf.planner_name(),
    )
}
