//! Execution types for the runner
//!
//! These types only exist at runtime, between the end of a run and the
//! moment its result is persisted or printed.

use gantry_core::domain::image::ImageReference;
use gantry_core::domain::revision::Revision;
use gantry_core::domain::run::RunResult;
use gantry_core::domain::scan::ScanVerdict;
use gantry_core::domain::stage::StageKind;
use uuid::Uuid;

use crate::error::PipelineError;

/// Outcome of one pipeline run
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub revision: Revision,
    pub image: Option<ImageReference>,
    /// Stages that ran to completion, in order
    pub completed: Vec<StageKind>,
    pub scan: Option<ScanVerdict>,
    /// Whether the image reached the registry
    pub pushed: bool,
    pub failure: Option<PipelineError>,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.failure.is_none()
    }

    /// Whether the deployment was updated to this run's image
    pub fn deployed(&self) -> bool {
        self.completed.contains(&StageKind::PostBuild)
    }

    /// Convert into the persisted run result
    pub fn into_run_result(self) -> RunResult {
        RunResult {
            success: self.failure.is_none(),
            image: self.image.map(|image| image.to_string()),
            scan: self.scan,
            failure: self.failure.as_ref().map(PipelineError::to_failure),
        }
    }
}
