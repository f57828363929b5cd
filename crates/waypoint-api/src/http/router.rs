//! Axum router construction.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use waypoint_core::checkpoint::CheckpointStore;
use waypoint_core::llm::TextCompletion;
use waypoint_core::routing::RoutingCapability;

use crate::http::handlers;
use crate::state::AppState;

/// Build the application router.
///
/// CORS is fully open: the chat UI is served from a different origin.
pub fn build_router<S, L, R>(state: AppState<S, L, R>) -> Router
where
    S: CheckpointStore + 'static,
    L: TextCompletion + 'static,
    R: RoutingCapability + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/chat", post(handlers::chat::stream_chat::<S, L, R>))
        .route(
            "/api/threads/{thread_id}",
            get(handlers::thread::get_thread::<S, L, R>)
                .delete(handlers::thread::delete_thread::<S, L, R>),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET / - liveness banner.
async fn root() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "message": "API is running" }))
}

/// GET /health
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use futures_util::StreamExt;
    use tower::ServiceExt;

    use waypoint_core::checkpoint::MemoryCheckpointStore;
    use waypoint_core::workflow::engine::WorkflowEngine;
    use waypoint_types::config::WaypointConfig;
    use waypoint_types::conversation::{ConversationState, Message};
    use waypoint_types::error::{LlmError, RoutingError};
    use waypoint_types::plan::RouteRequest;

    const TASK: &str = "Swap 100 USDC to ETH on Base using 0xAAA as sender and receiver";
    const PLAN: &str = "Plan: Swap USDC to ETH on Base\n\
         #E1 = Optimal_Path_SameChainSelf[USDC, 0xAAA, ETH, 0xAAA, BASE, BASE, 100]";

    /// Answers planner prompts with `PLAN` and chat prompts from a queue.
    #[derive(Default)]
    struct StubLlm {
        chat: Mutex<VecDeque<String>>,
    }

    impl StubLlm {
        fn replying(replies: &[&str]) -> Self {
            Self {
                chat: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            }
        }
    }

    impl TextCompletion for StubLlm {
        async fn complete(&self, system_prompt: &str, _history: &[Message]) -> Result<String, LlmError> {
            if system_prompt.starts_with("Break the user's") {
                return Ok(PLAN.to_string());
            }
            self.chat
                .lock()
                .unwrap()
                .pop_front()
                .ok_or(LlmError::EmptyResponse)
        }
    }

    struct StubRouter;

    impl RoutingCapability for StubRouter {
        async fn request_route(&self, request: &RouteRequest) -> Result<serde_json::Value, RoutingError> {
            Ok(serde_json::json!(format!("route:{}", request.input_amount)))
        }
    }

    type TestState = AppState<MemoryCheckpointStore, StubLlm, StubRouter>;

    fn state(llm: StubLlm) -> TestState {
        let engine = WorkflowEngine::new(MemoryCheckpointStore::new(), llm, StubRouter);
        AppState::new(engine, WaypointConfig::default())
    }

    fn chat_request(thread_id: &str, message: &str, should_execute: bool) -> Request<Body> {
        let body = serde_json::json!({
            "thread_id": thread_id,
            "messages": [{ "role": "user", "content": message }],
            "should_execute": should_execute,
        });
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let mut stream = response.into_body().into_data_stream();
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        String::from_utf8(out).unwrap()
    }

    /// JSON payloads of the `data:` lines, in order.
    fn data_frames(sse: &str) -> Vec<serde_json::Value> {
        sse.lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|data| serde_json::from_str(data.trim()).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn root_and_health() {
        let app = build_router(state(StubLlm::default()));

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["message"], "API is running");

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn conversational_turn_streams_one_reply() {
        let app = build_router(state(StubLlm::replying(&["Which chain are you on?"])));

        let response = app.oneshot(chat_request("t1", "hi", false)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()["content-type"]
                .to_str()
                .unwrap()
                .starts_with("text/event-stream")
        );

        let frames = data_frames(&body_text(response).await);
        assert_eq!(
            frames,
            vec![serde_json::json!({"content": "Which chain are you on?", "role": "assistant"})]
        );
    }

    #[tokio::test]
    async fn confirmed_task_streams_plan_and_execute_payload() {
        let ready = format!(
            "Running it.\n<task_ready>{{\"ready\": true, \"task\": \"{TASK}\"}}</task_ready>"
        );
        let app = build_router(state(StubLlm::replying(&[ready.as_str()])));

        let response = app
            .oneshot(chat_request("t2", "CONFIRM", true))
            .await
            .unwrap();
        let frames = data_frames(&body_text(response).await);

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0]["role"], "assistant");
        assert!(
            frames[1]["content"]
                .as_str()
                .unwrap()
                .starts_with("**Task Detected**")
        );
        assert_eq!(
            frames[2],
            serde_json::json!({"isExecute": true, "executePath": "route:100"})
        );
    }

    #[tokio::test]
    async fn client_disconnect_does_not_abort_the_turn() {
        let ready = format!(
            "Running it.\n<task_ready>{{\"ready\": true, \"task\": \"{TASK}\"}}</task_ready>"
        );
        let state = state(StubLlm::replying(&[ready.as_str()]));
        let app = build_router(state.clone());

        let response = app
            .oneshot(chat_request("t5", "CONFIRM", false))
            .await
            .unwrap();
        let mut stream = response.into_body().into_data_stream();
        let first = stream.next().await.unwrap().unwrap();
        assert!(String::from_utf8_lossy(&first).contains("data:"));
        drop(stream);

        // Waits on the thread lock until the spawned turn has saved.
        let saved = state.engine.thread("t5").await.unwrap().unwrap();
        assert!(saved.chain_finished);
        assert!(saved.is_task_idle());
        assert_eq!(
            saved.messages.last().map(|m| m.content.clone()),
            Some(format!("Optimal path found for: {TASK}"))
        );
    }

    #[tokio::test]
    async fn unreadable_checkpoint_streams_error_event() {
        let state = state(StubLlm::replying(&["hello"]));
        state.engine.store().insert_raw("broken", "{not json");
        let app = build_router(state);

        let response = app.oneshot(chat_request("broken", "hi", false)).await.unwrap();
        let text = body_text(response).await;

        assert!(text.contains("event: error"));
        let frames = data_frames(&text);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["error"], "checkpoint_decode");
    }

    #[tokio::test]
    async fn empty_messages_are_bad_request() {
        let app = build_router(state(StubLlm::default()));
        let request = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"thread_id":"t","messages":[]}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn thread_endpoint_returns_persisted_state() {
        let state = state(StubLlm::replying(&["Which chain?"]));
        let app = build_router(state.clone());

        let response = app
            .clone()
            .oneshot(chat_request("t3", "swap some USDC", false))
            .await
            .unwrap();
        body_text(response).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/threads/t3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let saved: ConversationState = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(saved.thread_id, "t3");
        assert_eq!(saved.messages.len(), 2);
        assert_eq!(saved.messages[1].content, "Which chain?");
    }

    #[tokio::test]
    async fn unknown_thread_is_not_found() {
        let app = build_router(state(StubLlm::default()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/threads/missing")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn corrupt_thread_is_500_with_decode_code() {
        let state = state(StubLlm::default());
        state.engine.store().insert_raw("bad", "[]");
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/threads/bad")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["error"]["code"], "CHECKPOINT_DECODE");
    }

    #[tokio::test]
    async fn delete_thread_then_missing() {
        let state = state(StubLlm::replying(&["ok"]));
        let app = build_router(state.clone());
        body_text(app.clone().oneshot(chat_request("t4", "hi", false)).await.unwrap()).await;

        let delete = || {
            Request::builder()
                .method("DELETE")
                .uri("/api/threads/t4")
                .body(Body::empty())
                .unwrap()
        };
        let response = app.clone().oneshot(delete()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = app.oneshot(delete()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
