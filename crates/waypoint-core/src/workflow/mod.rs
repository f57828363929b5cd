//! Plan-execute workflow: graph nodes, stages, and the engine that runs them.

pub mod converse;
pub mod engine;
pub mod graph;
pub mod locks;
pub mod parser;
pub mod planner;
pub mod step_runner;
