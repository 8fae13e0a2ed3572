//! Core domain types
//!
//! These types describe one build-scan-deploy run and everything it touches.
//! They are shared between the runner (which executes runs), the server
//! (which persists them) and the CLI (which displays them).

pub mod deployment;
pub mod image;
pub mod log;
pub mod revision;
pub mod run;
pub mod scan;
pub mod source;
pub mod stage;
