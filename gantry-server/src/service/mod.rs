//! Service Module
//!
//! Business logic layer for the server.
//! Services orchestrate between repositories and the run executor.

pub mod log;
pub mod run;

// Re-export for convenience
pub use log as log_service;
pub use run as run_service;
