//! Scheduler layer for the runner
//!
//! Watches the source branch and starts a run whenever its head moves.

pub mod poller;

pub use poller::{RevisionPoller, parse_ls_remote, write_log_artifact};
