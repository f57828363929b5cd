//! Observability setup for Waypoint: tracing subscriber installation and
//! optional OpenTelemetry export.

pub mod tracing_setup;
