//! Error types for the runner
//!
//! `ToolError` describes a failed interaction with an external tool.
//! `PipelineError` is the run-level taxonomy: one variant per failure kind,
//! each rendering a reason that names the stage and the kind.

use gantry_core::domain::run::RunFailure;
use gantry_core::domain::stage::{FailureKind, StageKind};
use std::path::PathBuf;
use thiserror::Error;

/// Failure of an external command, download or filesystem operation
#[derive(Debug, Error)]
pub enum ToolError {
    /// The program could not be started at all
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully
    #[error("'{program}' exited with code {code}: {stderr}")]
    NonZeroExit {
        program: String,
        code: i32,
        stderr: String,
    },

    /// A download failed
    #[error("download of {url} failed: {message}")]
    Download { url: String, message: String },

    /// A filesystem operation failed
    #[error("{action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required tool is not present
    #[error("{0}")]
    Missing(String),
}

impl ToolError {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Run-level error; the first one raised halts the run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("install stage failed (EnvironmentSetupError): {0}")]
    EnvironmentSetup(String),

    #[error("pre_build stage failed (AuthenticationError): {0}")]
    Authentication(String),

    #[error("build stage failed (BuildOrScanFailure): {0}")]
    BuildOrScan(String),

    #[error("post_build stage failed (PostBuildHealthCheckFailure): {0}")]
    PostBuildHealthCheck(String),

    #[error("post_build stage failed (DeploymentUpdateFailure): {0}")]
    DeploymentUpdate(String),
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::EnvironmentSetup(_) => FailureKind::EnvironmentSetupError,
            PipelineError::Authentication(_) => FailureKind::AuthenticationError,
            PipelineError::BuildOrScan(_) => FailureKind::BuildOrScanFailure,
            PipelineError::PostBuildHealthCheck(_) => FailureKind::PostBuildHealthCheckFailure,
            PipelineError::DeploymentUpdate(_) => FailureKind::DeploymentUpdateFailure,
        }
    }

    pub fn stage(&self) -> StageKind {
        self.kind().stage()
    }

    /// Converts into the persisted failure record
    pub fn to_failure(&self) -> RunFailure {
        RunFailure {
            stage: self.stage(),
            kind: self.kind(),
            reason: self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_names_stage_and_kind() {
        let errors = [
            PipelineError::EnvironmentSetup("x".into()),
            PipelineError::Authentication("x".into()),
            PipelineError::BuildOrScan("x".into()),
            PipelineError::PostBuildHealthCheck("x".into()),
            PipelineError::DeploymentUpdate("x".into()),
        ];

        for error in errors {
            let reason = error.to_string();
            assert!(reason.starts_with(error.stage().as_str()), "{}", reason);
            assert!(reason.contains(error.kind().as_str()), "{}", reason);
        }
    }

    #[test]
    fn test_to_failure() {
        let failure = PipelineError::BuildOrScan("scan did not pass".into()).to_failure();
        assert_eq!(failure.stage, StageKind::Build);
        assert_eq!(failure.kind, FailureKind::BuildOrScanFailure);
        assert!(failure.reason.ends_with("scan did not pass"));
    }
}
