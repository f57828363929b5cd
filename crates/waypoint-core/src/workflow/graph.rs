//! Workflow graph: nodes and the conditional edges between them.
//!
//! Edge decisions are pure functions of the state so they can be tested
//! without running any stage.

use std::fmt;

use waypoint_types::conversation::ConversationState;

/// Graph nodes, in the order a full turn visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    Init,
    Converse,
    Plan,
    Execute,
    Finish,
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Node::Init => "init",
            Node::Converse => "converse",
            Node::Plan => "plan",
            Node::Execute => "execute",
            Node::Finish => "finish",
        };
        f.write_str(name)
    }
}

/// What the runner does after a node completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Goto(Node),
    /// Normal per-turn stop; the caller sends the next message.
    Suspend,
    /// Task finished or abandoned.
    End,
}

/// `converse -> plan` only when this pass finalized a task.
pub fn route_after_converse(state: &ConversationState) -> Transition {
    if state.task_ready {
        Transition::Goto(Node::Plan)
    } else {
        Transition::Suspend
    }
}

/// `execute` loops until every step has a result.
pub fn route_after_execute(state: &ConversationState) -> Transition {
    if state.plan_complete() {
        Transition::Goto(Node::Finish)
    } else {
        Transition::Goto(Node::Execute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_types::conversation::StepResult;
    use waypoint_types::plan::{Step, ToolName};

    fn step(id: &str) -> Step {
        Step {
            description: "d".into(),
            step_id: id.into(),
            tool_name: ToolName::CrossChain,
            raw_args: String::new(),
        }
    }

    #[test]
    fn converse_suspends_until_task_ready() {
        let mut state = ConversationState::new("t");
        assert_eq!(route_after_converse(&state), Transition::Suspend);
        state.task_ready = true;
        assert_eq!(route_after_converse(&state), Transition::Goto(Node::Plan));
    }

    #[test]
    fn execute_loops_until_results_match_steps() {
        let mut state = ConversationState::new("t");
        state.steps = vec![step("#E1"), step("#E2")];
        assert_eq!(route_after_execute(&state), Transition::Goto(Node::Execute));

        state.results.push(StepResult {
            step_id: "#E1".into(),
            value: "a".into(),
        });
        assert_eq!(route_after_execute(&state), Transition::Goto(Node::Execute));

        state.results.push(StepResult {
            step_id: "#E2".into(),
            value: "b".into(),
        });
        assert_eq!(route_after_execute(&state), Transition::Goto(Node::Finish));
    }

    #[test]
    fn node_names_are_lowercase() {
        assert_eq!(Node::Converse.to_string(), "converse");
        assert_eq!(Node::Finish.to_string(), "finish");
    }
}
