//! Language model clients.
//!
//! [`create_completion`] builds the configured `TextCompletion` implementation,
//! resolving the API key from the environment.

pub mod openai_compat;

use waypoint_types::config::LlmConfig;
use waypoint_types::error::LlmError;

use self::openai_compat::OpenAiCompatibleCompletion;
use crate::config::resolve_api_key;

/// Build the completion client for `config`.
///
/// Fails with `AuthenticationFailed` when the variable named by
/// `api_key_env` is unset or empty.
pub fn create_completion(config: &LlmConfig) -> Result<OpenAiCompatibleCompletion, LlmError> {
    let api_key = resolve_api_key(config).ok_or_else(|| {
        tracing::error!(env = %config.api_key_env, "language model API key is not set");
        LlmError::AuthenticationFailed
    })?;

    tracing::info!(base_url = %config.base_url, model = %config.model, "language model client ready");
    Ok(OpenAiCompatibleCompletion::new(config, &api_key))
}
