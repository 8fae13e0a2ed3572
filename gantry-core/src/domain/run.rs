//! Run domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::revision::Revision;
use crate::domain::scan::ScanVerdict;
use crate::domain::stage::{FailureKind, StageKind};

/// One pipeline run for one revision
///
/// Structure shared between server (persists) and runner (produces the result).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: Uuid,
    pub revision: Revision,
    pub status: RunStatus,
    pub requested_at: chrono::DateTime<chrono::Utc>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub result: Option<RunResult>,
}

/// Run lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Succeeded | RunStatus::Failed)
    }
}

/// Final outcome of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub success: bool,
    /// Image reference built for the run, once derived
    pub image: Option<String>,
    /// Scan verdict, when the gate was reached
    pub scan: Option<ScanVerdict>,
    pub failure: Option<RunFailure>,
}

impl RunResult {
    pub fn status(&self) -> RunStatus {
        if self.success {
            RunStatus::Succeeded
        } else {
            RunStatus::Failed
        }
    }
}

/// Why a run halted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFailure {
    pub stage: StageKind,
    pub kind: FailureKind,
    /// Human readable reason, naming stage and kind
    pub reason: String,
}

impl std::fmt::Display for RunFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reason)
    }
}
