//! Plan parser: planner free text -> ordered list of `Step`s.
//!
//! The planner emits repeated blocks of the shape
//!
//! ```text
//! Plan: <description>
//! #E1 = Optimal_Path_SameChainSelf[USDC, 0xAAA, ETH, 0xAAA, BASE, BASE, 100]
//! ```
//!
//! The description may also share the line with the step assignment. Lines
//! that do not carry a step assignment are treated as prose: the most recent
//! one becomes the description of the next assignment without one.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use waypoint_types::error::TaskError;
use waypoint_types::plan::{MAX_PLAN_STEPS, Step, ToolName};

static STEP_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<id>#E\d+)\s*=\s*(?P<tool>\w+)\s*\[(?P<args>[^\]]*)\]")
        .expect("step assignment regex is valid")
});

static PLAN_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i:plan)\s*(?:\d+\s*)?:\s*")
        .expect("plan prefix regex is valid")
});

/// Pure parser with a configurable step cap.
#[derive(Debug, Clone)]
pub struct PlanParser {
    max_steps: usize,
}

impl Default for PlanParser {
    fn default() -> Self {
        Self {
            max_steps: MAX_PLAN_STEPS,
        }
    }
}

impl PlanParser {
    /// Create a parser; `max_steps` is clamped to `1..=MAX_PLAN_STEPS`.
    pub fn new(max_steps: usize) -> Self {
        Self {
            max_steps: max_steps.clamp(1, MAX_PLAN_STEPS),
        }
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Parse planner output.
    ///
    /// The whole plan is rejected on the first problem; a partial step list is
    /// never returned.
    pub fn parse(&self, text: &str) -> Result<Vec<Step>, TaskError> {
        let mut steps: Vec<Step> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut pending_description: Option<String> = None;

        for line in text.lines() {
            let Some(caps) = STEP_ASSIGNMENT.captures(line) else {
                let prose = strip_plan_prefix(line);
                if !prose.is_empty() {
                    pending_description = Some(prose.to_string());
                }
                continue;
            };

            let start = caps.get(0).map_or(0, |m| m.start());
            let inline = strip_plan_prefix(&line[..start]);
            let description = if inline.is_empty() {
                match pending_description.take() {
                    Some(d) => d,
                    None => {
                        tracing::debug!(line, "step assignment without description, ignoring");
                        continue;
                    }
                }
            } else {
                pending_description = None;
                inline.to_string()
            };

            let step_id = caps["id"].to_string();
            let tool = &caps["tool"];
            let tool_name = ToolName::from_str(tool).map_err(TaskError::UnknownTool)?;

            if !seen.insert(step_id.clone()) {
                return Err(TaskError::Parse(format!("duplicate step id {step_id}")));
            }
            if steps.len() >= self.max_steps {
                return Err(TaskError::Parse(format!(
                    "plan exceeds the {} step limit",
                    self.max_steps
                )));
            }

            steps.push(Step {
                description,
                step_id,
                tool_name,
                raw_args: caps["args"].to_string(),
            });
        }

        if steps.is_empty() {
            return Err(TaskError::Parse("planner output contains no steps".into()));
        }

        Ok(steps)
    }
}

fn strip_plan_prefix(segment: &str) -> &str {
    let trimmed = segment.trim();
    match PLAN_PREFIX.find(trimmed) {
        Some(m) => trimmed[m.end()..].trim(),
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(n: usize) -> String {
        format!(
            "Plan: move funds leg {n}\n#E{n} = Optimal_Path_SameChainSelf[USDC, 0xAAA, ETH, 0xAAA, BASE, BASE, {n}]\n"
        )
    }

    #[test]
    fn parses_single_step_block() {
        let text = "Plan: Swap 100 USDC to ETH on Base for 0xAAA\n\
                    #E1 = Optimal_Path_SameChainSelf[USDC, 0xAAA, ETH, 0xAAA, BASE, BASE, 100]";
        let steps = PlanParser::default().parse(text).unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].step_id, "#E1");
        assert_eq!(steps[0].tool_name, ToolName::SameChainSelf);
        assert_eq!(steps[0].description, "Swap 100 USDC to ETH on Base for 0xAAA");
        assert_eq!(steps[0].raw_args, "USDC, 0xAAA, ETH, 0xAAA, BASE, BASE, 100");
    }

    #[test]
    fn description_may_share_the_line() {
        let text = "Plan: bridge to Polygon. #E1 = Optimal_Path_CrossChain[USDC, 0xA, USDC, 0xA, BASE, POLYGON, 5]\n\
                    Plan: swap on Polygon #E2 = SameChainSelf[USDC, 0xA, ETH, 0xA, POLYGON, POLYGON, #E1]";
        let steps = PlanParser::default().parse(text).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].description, "bridge to Polygon.");
        assert_eq!(steps[0].tool_name, ToolName::CrossChain);
        assert_eq!(steps[1].step_id, "#E2");
        assert_eq!(steps[1].raw_args, "USDC, 0xA, ETH, 0xA, POLYGON, POLYGON, #E1");
    }

    #[test]
    fn prose_between_plans_is_ignored() {
        let text = "Sure! Here is the plan you asked for.\n\n\
                    Plan: send to a friend\n\
                    #E1 = Optimal_Path_SameChainOther[USDT, 0xA, USDT, 0xB, AVALANCHE, AVALANCHE, 7]\n\
                    That should do it.";
        let steps = PlanParser::default().parse(text).unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].description, "send to a friend");
        assert_eq!(steps[0].tool_name, ToolName::SameChainOther);
    }

    #[test]
    fn unknown_tool_is_fatal() {
        let text = "Plan: look it up\n#E1 = WebSearch[USDC price]";
        let err = PlanParser::default().parse(text).unwrap_err();
        assert_eq!(err, TaskError::UnknownTool("WebSearch".into()));
    }

    #[test]
    fn duplicate_step_ids_are_rejected() {
        let text = format!("{}{}", block(1), block(1));
        let err = PlanParser::default().parse(&text).unwrap_err();
        assert!(matches!(err, TaskError::Parse(ref m) if m.contains("duplicate")));
    }

    #[test]
    fn eleven_steps_exceed_the_cap() {
        let text: String = (1..=11).map(block).collect();
        let err = PlanParser::default().parse(&text).unwrap_err();
        assert!(matches!(err, TaskError::Parse(ref m) if m.contains("10 step limit")));

        let text: String = (1..=10).map(block).collect();
        assert_eq!(PlanParser::default().parse(&text).unwrap().len(), 10);
    }

    #[test]
    fn lowered_cap_is_enforced() {
        let text: String = (1..=3).map(block).collect();
        let err = PlanParser::new(2).parse(&text).unwrap_err();
        assert_eq!(err.kind(), "parse_error");
        assert_eq!(PlanParser::new(99).max_steps(), MAX_PLAN_STEPS);
    }

    #[test]
    fn empty_plan_is_a_parse_error() {
        let err = PlanParser::default()
            .parse("I could not come up with a plan.")
            .unwrap_err();
        assert_eq!(err.kind(), "parse_error");
    }

    #[test]
    fn raw_args_kept_verbatim() {
        let text = "Plan: odd spacing\n#E1 = SameChainSelf[ usdc ,0xA,  eth, 0xA , base,base , 1.5 ]";
        let steps = PlanParser::default().parse(text).unwrap();
        assert_eq!(steps[0].raw_args, " usdc ,0xA,  eth, 0xA , base,base , 1.5 ");
    }
}
