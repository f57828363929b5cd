//! Configuration types for Waypoint.
//!
//! `WaypointConfig` represents `config.toml` in the data directory. Every
//! section and field has a default, so an empty file (or no file) is valid.

use serde::{Deserialize, Serialize};

use crate::plan::MAX_PLAN_STEPS;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaypointConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Routing service endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    #[serde(default = "default_routing_url")]
    pub url: String,
    /// Per-request timeout for a single plan step.
    #[serde(default = "default_routing_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_routing_url() -> String {
    "http://localhost:3000/api/request-route".to_string()
}

fn default_routing_timeout_secs() -> u64 {
    30
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            url: default_routing_url(),
            timeout_secs: default_routing_timeout_secs(),
        }
    }
}

/// OpenAI-compatible completion provider.
///
/// The API key is never stored in the file; `api_key_env` names the
/// environment variable that holds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub temperature: f32,
}

fn default_llm_base_url() -> String {
    "https://api.together.xyz/v1".to_string()
}

fn default_llm_model() -> String {
    "meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo".to_string()
}

fn default_api_key_env() -> String {
    "WAYPOINT_LLM_API_KEY".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key_env: default_api_key_env(),
            temperature: 0.0,
        }
    }
}

/// Workflow engine limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Clamped to `MAX_PLAN_STEPS`; can only be lowered.
    #[serde(default = "default_max_plan_steps")]
    pub max_plan_steps: usize,
}

fn default_max_plan_steps() -> usize {
    MAX_PLAN_STEPS
}

impl EngineConfig {
    pub fn effective_max_steps(&self) -> usize {
        self.max_plan_steps.clamp(1, MAX_PLAN_STEPS)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_plan_steps: default_max_plan_steps(),
        }
    }
}
