//! SQLite persistence.

pub mod checkpoint;
pub mod pool;
