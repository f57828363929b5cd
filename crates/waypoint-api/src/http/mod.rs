//! HTTP layer: an axum router streaming chat turns as Server-Sent Events.

pub mod error;
pub mod frames;
pub mod handlers;
pub mod router;
