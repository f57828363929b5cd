//! Routing capability port.

use waypoint_types::error::RoutingError;
use waypoint_types::plan::RouteRequest;

/// Computes a concrete execution path for one token-movement request.
///
/// The response is treated as an opaque JSON value.
pub trait RoutingCapability: Send + Sync {
    fn request_route(
        &self,
        request: &RouteRequest,
    ) -> impl std::future::Future<Output = Result<serde_json::Value, RoutingError>> + Send;
}
