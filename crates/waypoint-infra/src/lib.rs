//! Infrastructure layer for Waypoint.
//!
//! Implements the ports defined in `waypoint-core`: SQLite checkpoint storage,
//! the HTTP routing client, and an OpenAI-compatible text completion client.
//! Also loads the on-disk configuration.

pub mod config;
pub mod llm;
pub mod routing;
pub mod sqlite;
