//! Configuration loader for Waypoint.
//!
//! Reads `config.toml` from the data directory (`~/.waypoint/` by default)
//! into [`WaypointConfig`], falling back to defaults when the file is missing
//! or malformed, then applies environment overrides.

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use waypoint_types::config::{LlmConfig, WaypointConfig};

/// Environment variable naming the data directory.
pub const DATA_DIR_ENV: &str = "WAYPOINT_DATA_DIR";
/// Overrides `[routing] url`.
pub const ROUTING_URL_ENV: &str = "WAYPOINT_ROUTING_URL";
/// Overrides `[llm] base_url`.
pub const LLM_BASE_URL_ENV: &str = "WAYPOINT_LLM_BASE_URL";
/// Overrides `[llm] model`.
pub const LLM_MODEL_ENV: &str = "WAYPOINT_LLM_MODEL";

/// Resolve the data directory.
///
/// Priority: explicit argument, `WAYPOINT_DATA_DIR`, `~/.waypoint`, `./.waypoint`.
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".waypoint")
}

/// Load configuration from `{data_dir}/config.toml` and apply env overrides.
pub async fn load_config(data_dir: &Path) -> WaypointConfig {
    let mut config = load_config_file(data_dir).await;
    apply_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

async fn load_config_file(data_dir: &Path) -> WaypointConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return WaypointConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return WaypointConfig::default();
        }
    };

    match toml::from_str::<WaypointConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            WaypointConfig::default()
        }
    }
}

/// Apply environment overrides through `lookup`; empty values are ignored.
pub fn apply_overrides<F>(config: &mut WaypointConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get(ROUTING_URL_ENV) {
        config.routing.url = url;
    }
    if let Some(base_url) = get(LLM_BASE_URL_ENV) {
        config.llm.base_url = base_url;
    }
    if let Some(model) = get(LLM_MODEL_ENV) {
        config.llm.model = model;
    }
}

/// Read the API key from the environment variable named in `[llm] api_key_env`.
pub fn resolve_api_key(llm: &LlmConfig) -> Option<SecretString> {
    std::env::var(&llm.api_key_env)
        .ok()
        .filter(|v| !v.is_empty())
        .map(SecretString::from)
}
