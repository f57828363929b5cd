//! Application state wiring the engine to its adapters.
//!
//! `AppState` is generic over the engine's collaborators so the router can be
//! driven by stubs in tests; [`LiveAppState`] pins it to the SQLite store, the
//! OpenAI-compatible model client and the HTTP routing client.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use waypoint_core::workflow::engine::WorkflowEngine;
use waypoint_core::workflow::parser::PlanParser;
use waypoint_core::workflow::step_runner::StepExecutor;
use waypoint_infra::config::load_config;
use waypoint_infra::llm::create_completion;
use waypoint_infra::llm::openai_compat::OpenAiCompatibleCompletion;
use waypoint_infra::routing::HttpRoutingClient;
use waypoint_infra::sqlite::checkpoint::SqliteCheckpointStore;
use waypoint_infra::sqlite::pool::{DatabasePool, database_url};
use waypoint_types::config::WaypointConfig;

pub type LiveAppState =
    AppState<SqliteCheckpointStore, OpenAiCompatibleCompletion, HttpRoutingClient>;

/// Shared state handed to every HTTP handler.
pub struct AppState<S, L, R> {
    pub engine: Arc<WorkflowEngine<S, L, R>>,
    pub config: Arc<WaypointConfig>,
}

impl<S, L, R> Clone for AppState<S, L, R> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S, L, R> AppState<S, L, R> {
    pub fn new(engine: WorkflowEngine<S, L, R>, config: WaypointConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            config: Arc::new(config),
        }
    }
}

impl LiveAppState {
    /// Load config, open the database and build the live engine.
    pub async fn init(data_dir: &Path) -> anyhow::Result<Self> {
        let config = load_config(data_dir).await;
        let store = open_store(data_dir).await?;

        let llm = create_completion(&config.llm)?;
        let router = HttpRoutingClient::from_config(&config.routing)?;

        let engine = WorkflowEngine::new(store, llm, router)
            .with_parser(PlanParser::new(config.engine.effective_max_steps()))
            .with_executor(StepExecutor::new(Duration::from_secs(
                config.routing.timeout_secs,
            )));

        tracing::info!(
            data_dir = %data_dir.display(),
            routing_url = %config.routing.url,
            max_plan_steps = config.engine.effective_max_steps(),
            "engine ready"
        );

        Ok(Self::new(engine, config))
    }
}

/// Open (creating if needed) the checkpoint database under `data_dir`.
pub async fn open_store(data_dir: &Path) -> anyhow::Result<SqliteCheckpointStore> {
    tokio::fs::create_dir_all(data_dir).await?;
    let pool = DatabasePool::new(&database_url(data_dir)).await?;
    Ok(SqliteCheckpointStore::new(pool))
}

/// Resolve the data directory from the CLI flag, env and home directory.
pub fn data_dir(explicit: Option<&Path>) -> PathBuf {
    waypoint_infra::config::resolve_data_dir(explicit)
}
