//! Stage and failure taxonomy

use serde::{Deserialize, Serialize};

/// The fixed, ordered stages of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StageKind {
    /// Fetch auxiliary tooling (the image scanner)
    Install,
    /// Resolve the image tag and bootstrap registry access
    PreBuild,
    /// Build, scan, gate and push the image
    Build,
    /// Health check and rollout to the deployment target
    PostBuild,
}

impl StageKind {
    /// Every stage in execution order
    pub const ALL: [StageKind; 4] = [
        StageKind::Install,
        StageKind::PreBuild,
        StageKind::Build,
        StageKind::PostBuild,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Install => "install",
            StageKind::PreBuild => "pre_build",
            StageKind::Build => "build",
            StageKind::PostBuild => "post_build",
        }
    }

    /// Parses the `as_str` form
    pub fn parse(s: &str) -> Option<Self> {
        StageKind::ALL.into_iter().find(|stage| stage.as_str() == s)
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of run failure, one per stage plus the rollout failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    EnvironmentSetupError,
    AuthenticationError,
    BuildOrScanFailure,
    PostBuildHealthCheckFailure,
    DeploymentUpdateFailure,
}

impl FailureKind {
    pub const ALL: [FailureKind; 5] = [
        FailureKind::EnvironmentSetupError,
        FailureKind::AuthenticationError,
        FailureKind::BuildOrScanFailure,
        FailureKind::PostBuildHealthCheckFailure,
        FailureKind::DeploymentUpdateFailure,
    ];

    /// Stage that raises this kind of failure
    pub fn stage(&self) -> StageKind {
        match self {
            FailureKind::EnvironmentSetupError => StageKind::Install,
            FailureKind::AuthenticationError => StageKind::PreBuild,
            FailureKind::BuildOrScanFailure => StageKind::Build,
            FailureKind::PostBuildHealthCheckFailure | FailureKind::DeploymentUpdateFailure => {
                StageKind::PostBuild
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::EnvironmentSetupError => "EnvironmentSetupError",
            FailureKind::AuthenticationError => "AuthenticationError",
            FailureKind::BuildOrScanFailure => "BuildOrScanFailure",
            FailureKind::PostBuildHealthCheckFailure => "PostBuildHealthCheckFailure",
            FailureKind::DeploymentUpdateFailure => "DeploymentUpdateFailure",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        FailureKind::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_round_trip_names() {
        for stage in StageKind::ALL {
            assert_eq!(StageKind::parse(stage.as_str()), Some(stage));
        }
        assert_eq!(StageKind::parse("deploy"), None);
    }

    #[test]
    fn test_stage_order() {
        let mut sorted = StageKind::ALL;
        sorted.sort();
        assert_eq!(sorted, StageKind::ALL);
    }

    #[test]
    fn test_failure_kind_stages() {
        assert_eq!(FailureKind::EnvironmentSetupError.stage(), StageKind::Install);
        assert_eq!(FailureKind::AuthenticationError.stage(), StageKind::PreBuild);
        assert_eq!(FailureKind::BuildOrScanFailure.stage(), StageKind::Build);
        assert_eq!(
            FailureKind::PostBuildHealthCheckFailure.stage(),
            StageKind::PostBuild
        );
        assert_eq!(FailureKind::DeploymentUpdateFailure.stage(), StageKind::PostBuild);
    }
}
