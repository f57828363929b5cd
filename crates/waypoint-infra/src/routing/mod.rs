//! HTTP routing client.
//!
//! [`HttpRoutingClient`] implements `RoutingCapability` from `waypoint-core`
//! by POSTing the decoded step arguments to the routing service.

use std::time::Duration;

use waypoint_core::routing::RoutingCapability;
use waypoint_types::config::RoutingConfig;
use waypoint_types::error::RoutingError;
use waypoint_types::plan::RouteRequest;

/// Longest response body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

/// Routing capability backed by `POST <url>` with a JSON body.
#[derive(Clone)]
pub struct HttpRoutingClient {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpRoutingClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RoutingError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("waypoint/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RoutingError::Request(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

    pub fn from_config(config: &RoutingConfig) -> Result<Self, RoutingError> {
        Self::new(config.url.clone(), Duration::from_secs(config.timeout_secs))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

impl RoutingCapability for HttpRoutingClient {
    async fn request_route(
        &self,
        request: &RouteRequest,
    ) -> Result<serde_json::Value, RoutingError> {
        tracing::info!(
            url = %self.url,
            from_token = %request.from_token,
            to_token = %request.to_token,
            from_chain = %request.from_chain_name,
            to_chain = %request.to_chain_name,
            "requesting route"
        );

        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RoutingError::Timeout {
                        secs: self.timeout.as_secs(),
                    }
                } else {
                    RoutingError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "routing service returned an error");
            return Err(RoutingError::Status {
                status: status.as_u16(),
                body: truncate(&body),
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| RoutingError::Decode(e.to_string()))
    }
}
