//! Shared domain types for Waypoint.
//!
//! This crate contains the core domain types used across the workspace:
//! the per-thread `ConversationState`, parsed plan steps, the routing request
//! body, engine events, configuration and the error enums shared by the
//! engine and its adapters.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod conversation;
pub mod error;
pub mod event;
pub mod plan;
