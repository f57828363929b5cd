//! Thread inspection endpoints.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use waypoint_core::checkpoint::CheckpointStore;
use waypoint_core::llm::TextCompletion;
use waypoint_core::routing::RoutingCapability;
use waypoint_types::conversation::ConversationState;

use crate::http::error::AppError;
use crate::state::AppState;

/// GET /api/threads/{thread_id} - the persisted state of a thread.
pub async fn get_thread<S, L, R>(
    State(state): State<AppState<S, L, R>>,
    Path(thread_id): Path<String>,
) -> Result<Json<ConversationState>, AppError>
where
    S: CheckpointStore + 'static,
    L: TextCompletion + 'static,
    R: RoutingCapability + 'static,
{
    state
        .engine
        .thread(&thread_id)
        .await?
        .map(Json)
        .ok_or(AppError::ThreadNotFound(thread_id))
}

/// DELETE /api/threads/{thread_id} - forget a thread.
pub async fn delete_thread<S, L, R>(
    State(state): State<AppState<S, L, R>>,
    Path(thread_id): Path<String>,
) -> Result<StatusCode, AppError>
where
    S: CheckpointStore + 'static,
    L: TextCompletion + 'static,
    R: RoutingCapability + 'static,
{
    if state.engine.reset_thread(&thread_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::ThreadNotFound(thread_id))
    }
}
