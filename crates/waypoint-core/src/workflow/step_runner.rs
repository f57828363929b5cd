//! Step executor: substitute prior results, decode arguments, dispatch to the
//! routing capability, and record the result.
//!
//! Steps run strictly one at a time. A failure at any stage aborts the plan
//! without recording a partial result.

use std::str::FromStr;
use std::time::Duration;

use waypoint_types::conversation::StepResult;
use waypoint_types::error::{RoutingError, TaskError};
use waypoint_types::plan::{Chain, RouteRequest, Step, Token};

use crate::routing::RoutingCapability;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default per-step routing timeout in seconds.
pub const DEFAULT_ROUTE_TIMEOUT_SECS: u64 = 30;

/// Number of positional fields in a step's argument list.
pub const ROUTE_ARG_COUNT: usize = 7;

// ---------------------------------------------------------------------------
// Substitution
// ---------------------------------------------------------------------------

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Replace references to earlier step ids in `raw` with their values.
///
/// Single left-to-right scan. At each position the longest known id that sits
/// on a token boundary wins, so `#E1` never matches inside `#E10`. Inserted
/// values are never rescanned.
pub fn substitute_results(raw: &str, results: &[StepResult]) -> String {
    if results.is_empty() {
        return raw.to_string();
    }

    let mut keys: Vec<&StepResult> = results.iter().filter(|r| !r.step_id.is_empty()).collect();
    keys.sort_by(|a, b| b.step_id.len().cmp(&a.step_id.len()));

    let mut out = String::with_capacity(raw.len());
    let mut prev: Option<char> = None;
    let mut rest = raw;

    'scan: while let Some(c) = rest.chars().next() {
        for result in &keys {
            let id = result.step_id.as_str();
            if !rest.starts_with(id) {
                continue;
            }
            let starts_word = id.chars().next().is_some_and(is_word_char);
            let ends_word = id.chars().last().is_some_and(is_word_char);
            if starts_word && prev.is_some_and(is_word_char) {
                continue;
            }
            if ends_word && rest[id.len()..].chars().next().is_some_and(is_word_char) {
                continue;
            }

            out.push_str(&result.value);
            prev = id.chars().last();
            rest = &rest[id.len()..];
            continue 'scan;
        }

        out.push(c);
        prev = Some(c);
        rest = &rest[c.len_utf8()..];
    }

    out
}

// ---------------------------------------------------------------------------
// Argument decoding
// ---------------------------------------------------------------------------

/// Decode a substituted argument string into a routing request.
///
/// Fields, in order: from token, sender address, to token, receiver address,
/// from chain, to chain, amount.
pub fn decode_route_request(args: &str) -> Result<RouteRequest, TaskError> {
    let fields: Vec<&str> = args.split(',').map(str::trim).collect();
    if fields.len() != ROUTE_ARG_COUNT {
        return Err(TaskError::Validation(format!(
            "expected {ROUTE_ARG_COUNT} arguments, got {}",
            fields.len()
        )));
    }
    if let Some(pos) = fields.iter().position(|f| f.is_empty()) {
        return Err(TaskError::Validation(format!(
            "argument {} is empty",
            pos + 1
        )));
    }

    Ok(RouteRequest {
        from_token: Token::from_str(fields[0]).map_err(TaskError::Validation)?,
        user_address: fields[1].to_string(),
        to_token: Token::from_str(fields[2]).map_err(TaskError::Validation)?,
        receiver_address: fields[3].to_string(),
        from_chain_name: Chain::from_str(fields[4]).map_err(TaskError::Validation)?,
        to_chain_name: Chain::from_str(fields[5]).map_err(TaskError::Validation)?,
        input_amount: fields[6].to_string(),
    })
}

/// Stored form of a routing result: JSON strings are kept as their text,
/// anything else is serialized.
pub fn stringify_result(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// StepExecutor
// ---------------------------------------------------------------------------

/// Runs one plan step against a routing capability.
#[derive(Debug, Clone)]
pub struct StepExecutor {
    route_timeout: Duration,
}

impl Default for StepExecutor {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_ROUTE_TIMEOUT_SECS))
    }
}

impl StepExecutor {
    pub fn new(route_timeout: Duration) -> Self {
        Self { route_timeout }
    }

    pub fn route_timeout(&self) -> Duration {
        self.route_timeout
    }

    /// Execute `step` given the results recorded so far.
    pub async fn execute<R: RoutingCapability>(
        &self,
        router: &R,
        step: &Step,
        results: &[StepResult],
    ) -> Result<StepResult, TaskError> {
        let args = substitute_results(&step.raw_args, results);
        let request = decode_route_request(&args)?;

        tracing::info!(
            step_id = %step.step_id,
            tool = %step.tool_name,
            reason = step.tool_name.reason(),
            from_chain = %request.from_chain_name,
            to_chain = %request.to_chain_name,
            "dispatching route request"
        );

        let value = match tokio::time::timeout(self.route_timeout, router.request_route(&request))
            .await
        {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                return Err(RoutingError::Timeout {
                    secs: self.route_timeout.as_secs(),
                }
                .into());
            }
        };

        tracing::debug!(step_id = %step.step_id, "route request completed");

        Ok(StepResult {
            step_id: step.step_id.clone(),
            value: stringify_result(&value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use waypoint_types::plan::ToolName;

    fn result(id: &str, value: &str) -> StepResult {
        StepResult {
            step_id: id.to_string(),
            value: value.to_string(),
        }
    }

    fn step(args: &str) -> Step {
        Step {
            description: "test step".into(),
            step_id: "#E2".into(),
            tool_name: ToolName::CrossChain,
            raw_args: args.into(),
        }
    }

    struct RecordingRouter {
        calls: Mutex<Vec<RouteRequest>>,
        reply: Result<serde_json::Value, RoutingError>,
        delay: Duration,
    }

    impl RecordingRouter {
        fn ok(reply: serde_json::Value) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                reply: Ok(reply),
                delay: Duration::ZERO,
            }
        }
    }

    impl RoutingCapability for RecordingRouter {
        async fn request_route(
            &self,
            request: &RouteRequest,
        ) -> Result<serde_json::Value, RoutingError> {
            self.calls.lock().unwrap().push(request.clone());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.reply.clone()
        }
    }

    #[test]
    fn substitutes_known_results() {
        let out = substitute_results("#E1, addr, ETH", &[result("#E1", "USDC")]);
        assert_eq!(out, "USDC, addr, ETH");
    }

    #[test]
    fn substitution_does_not_match_id_prefixes() {
        let results = [result("#E1", "one"), result("#E10", "ten")];
        assert_eq!(substitute_results("#E10 #E1 #E11", &results), "ten one #E11");

        let only_short = [result("#E1", "one")];
        assert_eq!(substitute_results("#E10,#E1", &only_short), "#E10,one");
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let results = [result("#E1", "#E2"), result("#E2", "two")];
        assert_eq!(substitute_results("#E1 #E2", &results), "#E2 two");
    }

    #[test]
    fn substitution_respects_word_boundaries_for_word_ids() {
        let results = [result("E1", "x")];
        assert_eq!(substitute_results("E1 AE1 E1B E1", &results), "x AE1 E1B x");
    }

    #[test]
    fn decode_normalizes_case() {
        let req = decode_route_request("usdc, 0xA, eth, 0xB, base, Polygon, 42").unwrap();
        assert_eq!(req.from_token, Token::Usdc);
        assert_eq!(req.to_token, Token::Eth);
        assert_eq!(req.from_chain_name, Chain::Base);
        assert_eq!(req.to_chain_name, Chain::Polygon);
        assert_eq!(req.user_address, "0xA");
        assert_eq!(req.receiver_address, "0xB");
        assert_eq!(req.input_amount, "42");
    }

    #[test]
    fn decode_rejects_wrong_field_count() {
        let err = decode_route_request("USDC, 0xA, ETH, 0xB, BASE, BASE").unwrap_err();
        assert_eq!(err.kind(), "validation_error");
        let err = decode_route_request("USDC, 0xA, ETH, 0xB, BASE, BASE, 1, 2").unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }

    #[test]
    fn decode_rejects_unsupported_token_and_chain() {
        let err = decode_route_request("USDC, 0xA, DOGE, 0xB, BASE, BASE, 1").unwrap_err();
        assert!(matches!(err, TaskError::Validation(ref m) if m.contains("DOGE")));
        let err = decode_route_request("USDC, 0xA, ETH, 0xB, BASE, SOLANA, 1").unwrap_err();
        assert!(matches!(err, TaskError::Validation(ref m) if m.contains("SOLANA")));
        let err = decode_route_request("USDC, , ETH, 0xB, BASE, BASE, 1").unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }

    #[test]
    fn stringify_keeps_string_text() {
        assert_eq!(stringify_result(&serde_json::json!("route-1")), "route-1");
        assert_eq!(
            stringify_result(&serde_json::json!({"routes": [1]})),
            r#"{"routes":[1]}"#
        );
    }

    #[tokio::test]
    async fn execute_substitutes_then_dispatches() {
        let router = RecordingRouter::ok(serde_json::json!({"routes": ["a"]}));
        let executor = StepExecutor::default();
        let results = [result("#E1", "250")];

        let out = executor
            .execute(&router, &step("USDC, 0xA, USDC, 0xA, BASE, POLYGON, #E1"), &results)
            .await
            .unwrap();

        assert_eq!(out.step_id, "#E2");
        assert_eq!(out.value, r#"{"routes":["a"]}"#);
        let calls = router.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].input_amount, "250");
    }

    #[tokio::test]
    async fn validation_failure_never_dispatches() {
        let router = RecordingRouter::ok(serde_json::json!({}));
        let err = StepExecutor::default()
            .execute(&router, &step("USDC, 0xA, DOGE, 0xA, BASE, BASE, 1"), &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");
        assert!(router.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_maps_to_transport_error() {
        let router = RecordingRouter {
            calls: Mutex::new(Vec::new()),
            reply: Err(RoutingError::Status {
                status: 500,
                body: "boom".into(),
            }),
            delay: Duration::ZERO,
        };
        let err = StepExecutor::default()
            .execute(&router, &step("USDC, 0xA, ETH, 0xA, BASE, BASE, 1"), &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "transport_error");
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_route_times_out() {
        let router = RecordingRouter {
            calls: Mutex::new(Vec::new()),
            reply: Ok(serde_json::json!({})),
            delay: Duration::from_secs(60),
        };
        let err = StepExecutor::new(Duration::from_secs(5))
            .execute(&router, &step("USDC, 0xA, ETH, 0xA, BASE, BASE, 1"), &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "transport_error");
        assert!(err.to_string().contains("timed out"));
    }
}
