//! Execution context for a pipeline run
//!
//! The context is the only state shared between stages. Stages read what
//! earlier stages produced from it and export named variables through it;
//! external commands see nothing but those variables and the files in the
//! run workspace.

use gantry_core::domain::deployment::DeploymentTarget;
use gantry_core::domain::image::ImageReference;
use gantry_core::domain::log::{LogEntry, LogLevel};
use gantry_core::domain::revision::Revision;
use gantry_core::domain::scan::ScanVerdict;
use gantry_core::domain::stage::StageKind;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::service::LogBufferService;

/// Named variables exported to every external command
pub type StageEnv = BTreeMap<String, String>;

pub const ENV_REVISION: &str = "REVISION";
pub const ENV_TAG: &str = "TAG";
pub const ENV_IMAGE: &str = "IMAGE";
pub const ENV_REGISTRY_URI: &str = "REGISTRY_URI";
pub const ENV_CLUSTER_NAME: &str = "CLUSTER_NAME";
pub const ENV_DEPLOYMENT: &str = "DEPLOYMENT";
pub const ENV_CONTAINER: &str = "CONTAINER";
pub const ENV_SCANNER: &str = "SCANNER";

/// Filesystem locations of one run
#[derive(Debug, Clone)]
pub struct RunPaths {
    /// Scratch directory of the run (reports, tools)
    pub workspace: PathBuf,
    /// Directory holding the image recipe
    pub build_context: PathBuf,
    /// Where auxiliary tooling is installed
    pub tools: PathBuf,
}

/// Execution context threaded through every stage
pub struct RunContext {
    pub run_id: Uuid,
    pub revision: Revision,
    pub registry_uri: String,
    pub cluster_name: String,
    pub target: DeploymentTarget,
    pub paths: RunPaths,

    /// Derived during pre-build
    pub image: Option<ImageReference>,
    /// Set by install
    pub scanner_path: Option<PathBuf>,
    /// Report artifact written during build
    pub scan_report: Option<PathBuf>,
    pub scan_verdict: Option<ScanVerdict>,

    /// Health flag of the build itself, checked before rollout
    pub build_succeeding: bool,
    /// Whether the image reached the registry
    pub pushed: bool,

    env: StageEnv,
    stage: Option<StageKind>,
    logs: Arc<dyn LogBufferService>,
}

impl RunContext {
    /// Creates a new run context
    ///
    /// `base_env` is merged first; the named variables set later by stages
    /// always take precedence over it.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        run_id: Uuid,
        revision: Revision,
        registry_uri: impl Into<String>,
        cluster_name: impl Into<String>,
        target: DeploymentTarget,
        paths: RunPaths,
        base_env: StageEnv,
        logs: Arc<dyn LogBufferService>,
    ) -> Self {
        let registry_uri = registry_uri.into();
        let cluster_name = cluster_name.into();

        let mut env = base_env;
        env.insert(ENV_REVISION.to_string(), revision.to_string());
        env.insert(ENV_REGISTRY_URI.to_string(), registry_uri.clone());
        env.insert(ENV_CLUSTER_NAME.to_string(), cluster_name.clone());
        env.insert(ENV_DEPLOYMENT.to_string(), target.deployment.clone());
        env.insert(ENV_CONTAINER.to_string(), target.container.clone());

        Self {
            run_id,
            revision,
            registry_uri,
            cluster_name,
            target,
            paths,
            image: None,
            scanner_path: None,
            scan_report: None,
            scan_verdict: None,
            build_succeeding: false,
            pushed: false,
            env,
            stage: None,
            logs,
        }
    }

    /// Named variables visible to external commands
    pub fn env(&self) -> &StageEnv {
        &self.env
    }

    pub fn set_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.env.insert(key.into(), value.into());
    }

    /// Marks the stage subsequent log entries belong to
    pub fn enter_stage(&mut self, stage: Option<StageKind>) {
        self.stage = stage;
    }

    pub fn current_stage(&self) -> Option<StageKind> {
        self.stage
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.logs
            .add_entry(LogEntry::new(level, self.stage, message));
    }

    pub fn log_debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn log_info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn log_warning(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message);
    }

    pub fn log_error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    /// Records captured process output, one entry per stream
    pub fn log_output(&self, stdout: &str, stderr: &str) {
        if !stdout.trim().is_empty() {
            self.log_debug(stdout.trim_end());
        }
        if !stderr.trim().is_empty() {
            self.log_debug(stderr.trim_end());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::InMemoryLogBuffer;

    fn context(base_env: StageEnv, logs: Arc<dyn LogBufferService>) -> RunContext {
        RunContext::new(
            Uuid::new_v4(),
            Revision::parse("abc123").unwrap(),
            "repo",
            "demo-cluster",
            DeploymentTarget::default(),
            RunPaths {
                workspace: PathBuf::from("/tmp/ws"),
                build_context: PathBuf::from("/tmp/ws/src/app"),
                tools: PathBuf::from("/tmp/ws/tools"),
            },
            base_env,
            logs,
        )
    }

    #[test]
    fn test_named_variables_override_base_env() {
        let mut base = StageEnv::new();
        base.insert(ENV_CLUSTER_NAME.to_string(), "spoofed".to_string());
        base.insert("EXTRA".to_string(), "kept".to_string());

        let ctx = context(base, Arc::new(InMemoryLogBuffer::new()));
        assert_eq!(ctx.env().get(ENV_CLUSTER_NAME).unwrap(), "demo-cluster");
        assert_eq!(ctx.env().get(ENV_REGISTRY_URI).unwrap(), "repo");
        assert_eq!(ctx.env().get(ENV_REVISION).unwrap(), "abc123");
        assert_eq!(ctx.env().get("EXTRA").unwrap(), "kept");
    }

    #[test]
    fn test_logs_are_tagged_with_stage() {
        let buffer = InMemoryLogBuffer::new();
        let mut ctx = context(StageEnv::new(), Arc::new(buffer.clone()));

        ctx.log_info("before");
        ctx.enter_stage(Some(StageKind::Install));
        ctx.log_output("out\n", "  ");

        let entries = buffer.drain();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].stage, None);
        assert_eq!(entries[1].stage, Some(StageKind::Install));
        assert_eq!(entries[1].message, "out");
    }
}
