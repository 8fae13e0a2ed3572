//! Repository Module
//!
//! Data access layer for the server.
//! Each repository handles database operations for a specific domain entity.

pub mod log;
pub mod run;

// Re-export for convenience
pub use log as log_repository;
pub use run as run_repository;
