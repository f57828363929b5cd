//! Core engine for Waypoint.
//!
//! Defines the capability ports the engine depends on (checkpoint storage,
//! text completion, routing) and the plan-execute workflow built on them.
//! Infrastructure crates implement the ports; nothing here performs I/O
//! directly.

pub mod checkpoint;
pub mod llm;
pub mod prompts;
pub mod routing;
pub mod workflow;
