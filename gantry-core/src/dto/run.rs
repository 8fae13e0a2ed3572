//! Run DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::revision::Revision;
use crate::domain::run::{Run, RunStatus};
use crate::domain::stage::FailureKind;

/// Revision-available notification that triggers a run
///
/// Only `revision` is required. The other fields are carried for logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerRun {
    pub revision: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,
}

/// Lightweight run view for listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub id: Uuid,
    pub revision: Revision,
    pub status: RunStatus,
    pub requested_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub failure: Option<FailureKind>,
}

impl From<Run> for RunSummary {
    fn from(run: Run) -> Self {
        Self {
            id: run.id,
            revision: run.revision,
            status: run.status,
            requested_at: run.requested_at,
            completed_at: run.completed_at,
            failure: run
                .result
                .and_then(|result| result.failure)
                .map(|failure| failure.kind),
        }
    }
}
