//! Gantry runner
//!
//! Executes build-scan-deploy runs for one revision at a time:
//! - Install: fetch the image scanner
//! - PreBuild: derive the image reference, prepare credentials
//! - Build: build, scan, and push only when the scan passes
//! - PostBuild: roll the deployment to the pushed image
//!
//! The library is shared by the `gantry-runner` poller, the webhook server
//! and the `gantry` CLI.

pub mod collaborators;
pub mod config;
pub mod context;
pub mod error;
pub mod execution;
pub mod gate;
pub mod process;
pub mod scheduler;
pub mod service;
pub mod stage;
pub mod workspace;

#[cfg(test)]
mod testing;

pub use config::{PipelineConfig, PollerConfig};
pub use execution::RunReport;
pub use service::{ExecutionService, InMemoryLogBuffer, LogBufferService, StandardExecutionService};
