//! Test doubles for collaborators
//!
//! `RecordingProcess` records command lines and answers by substring match.
//! `FakeWorld` implements every collaborator trait over shared in-memory
//! state (registry contents, deployment image) with switchable failures.

use async_trait::async_trait;
use gantry_core::domain::deployment::DeploymentTarget;
use gantry_core::domain::image::ImageReference;
use gantry_core::domain::revision::Revision;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::collaborators::{
    Cluster, Collaborators, ImageBuilder, Registry, Scanner, SourceFetcher, ToolInstaller,
};
use crate::context::StageEnv;
use crate::error::ToolError;
use crate::process::{CommandOutput, CommandSpec, ProcessRunner};

#[derive(Default)]
pub struct RecordingProcess {
    calls: Mutex<Vec<CommandSpec>>,
    responses: Vec<(String, String)>,
    failures: Vec<(String, i32)>,
    unstartable: Vec<String>,
}

impl RecordingProcess {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands containing `pattern` print `stdout`
    pub fn respond(mut self, pattern: &str, stdout: &str) -> Self {
        self.responses.push((pattern.to_string(), stdout.to_string()));
        self
    }

    /// Commands containing `pattern` exit with `code`
    pub fn fail_on(mut self, pattern: &str, code: i32) -> Self {
        self.failures.push((pattern.to_string(), code));
        self
    }

    /// Commands containing `pattern` cannot be started
    pub fn unstartable(mut self, pattern: &str) -> Self {
        self.unstartable.push(pattern.to_string());
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessRunner for RecordingProcess {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ToolError> {
        self.calls.lock().unwrap().push(spec.clone());
        let line = spec.display();

        if self.unstartable.iter().any(|p| line.contains(p.as_str())) {
            return Err(ToolError::Spawn {
                program: spec.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            });
        }

        let stdout = self
            .responses
            .iter()
            .find(|(p, _)| line.contains(p.as_str()))
            .map(|(_, out)| out.clone())
            .unwrap_or_default();
        let exit_code = self
            .failures
            .iter()
            .find(|(p, _)| line.contains(p.as_str()))
            .map(|(_, code)| *code)
            .unwrap_or(0);

        Ok(CommandOutput {
            stdout,
            stderr: if exit_code == 0 {
                String::new()
            } else {
                "simulated failure".to_string()
            },
            exit_code,
        })
    }
}

/// What the fake scanner does
#[derive(Debug, Clone)]
pub enum ScanBehavior {
    Report(String),
    /// No report at all (crash, timeout)
    Error,
}

#[derive(Debug, Default)]
pub struct WorldState {
    pub events: Vec<String>,
    pub registry: Vec<String>,
    pub deployed: Option<String>,
    pub envs: Vec<StageEnv>,
}

pub struct FakeWorld {
    pub state: Mutex<WorldState>,
    pub scan: Mutex<ScanBehavior>,
    pub fail_install: bool,
    pub fail_build: bool,
    pub fail_login: bool,
    pub fail_push: bool,
    pub fail_probe: bool,
    pub fail_set_image: bool,
    pub fail_source: bool,
}

impl FakeWorld {
    pub fn new(scan: ScanBehavior) -> Self {
        Self {
            state: Mutex::new(WorldState::default()),
            scan: Mutex::new(scan),
            fail_install: false,
            fail_build: false,
            fail_login: false,
            fail_push: false,
            fail_probe: false,
            fail_set_image: false,
            fail_source: false,
        }
    }

    pub fn passing() -> Self {
        Self::new(ScanBehavior::Report(
            "Evaluation: ...status is pass...".to_string(),
        ))
    }

    pub fn events(&self) -> Vec<String> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn registry(&self) -> Vec<String> {
        self.state.lock().unwrap().registry.clone()
    }

    pub fn deployed(&self) -> Option<String> {
        self.state.lock().unwrap().deployed.clone()
    }

    pub fn envs(&self) -> Vec<StageEnv> {
        self.state.lock().unwrap().envs.clone()
    }

    fn record(&self, event: String, env: Option<&StageEnv>) {
        let mut state = self.state.lock().unwrap();
        state.events.push(event);
        if let Some(env) = env {
            state.envs.push(env.clone());
        }
    }

    fn outcome(failed: bool, what: &str) -> Result<CommandOutput, ToolError> {
        if failed {
            Err(ToolError::NonZeroExit {
                program: what.to_string(),
                code: 1,
                stderr: format!("{} failed", what),
            })
        } else {
            Ok(CommandOutput::default())
        }
    }

    /// Collaborators that all point at this world
    pub fn collaborators(self: &Arc<Self>, process: Arc<dyn ProcessRunner>) -> Collaborators {
        Collaborators {
            tools: self.clone(),
            builder: self.clone(),
            registry: self.clone(),
            scanner: self.clone(),
            cluster: self.clone(),
            source: self.clone(),
            process,
        }
    }
}

#[async_trait]
impl ToolInstaller for FakeWorld {
    async fn install(&self, tools_dir: &Path) -> Result<PathBuf, ToolError> {
        self.record("install".to_string(), None);
        Self::outcome(self.fail_install, "install")?;
        Ok(tools_dir.join("inline_scan.sh"))
    }
}

#[async_trait]
impl SourceFetcher for FakeWorld {
    async fn materialize(&self, revision: &Revision, dest: &Path) -> Result<PathBuf, ToolError> {
        self.record(format!("source {}", revision), None);
        Self::outcome(self.fail_source, "git clone")?;
        Ok(dest.to_path_buf())
    }
}

#[async_trait]
impl ImageBuilder for FakeWorld {
    async fn build(
        &self,
        _context_dir: &Path,
        image: &ImageReference,
        env: &StageEnv,
    ) -> Result<CommandOutput, ToolError> {
        self.record(format!("build {}", image), Some(env));
        Self::outcome(self.fail_build, "docker build")
    }
}

#[async_trait]
impl Registry for FakeWorld {
    async fn login(&self, env: &StageEnv) -> Result<(), ToolError> {
        self.record("login".to_string(), Some(env));
        Self::outcome(self.fail_login, "login").map(|_| ())
    }

    async fn push(
        &self,
        image: &ImageReference,
        env: &StageEnv,
    ) -> Result<CommandOutput, ToolError> {
        self.record(format!("push {}", image), Some(env));
        Self::outcome(self.fail_push, "docker push")?;

        let mut state = self.state.lock().unwrap();
        let image = image.to_string();
        if !state.registry.contains(&image) {
            state.registry.push(image);
        }
        Ok(CommandOutput::default())
    }
}

#[async_trait]
impl Scanner for FakeWorld {
    async fn scan(
        &self,
        _scanner: &Path,
        image: &ImageReference,
        env: &StageEnv,
    ) -> Result<String, ToolError> {
        self.record(format!("scan {}", image), Some(env));
        match self.scan.lock().unwrap().clone() {
            ScanBehavior::Report(report) => Ok(report),
            ScanBehavior::Error => Err(ToolError::Spawn {
                program: "inline_scan.sh".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out"),
            }),
        }
    }
}

#[async_trait]
impl Cluster for FakeWorld {
    async fn probe(&self, env: &StageEnv) -> Result<CommandOutput, ToolError> {
        self.record("probe".to_string(), Some(env));
        Self::outcome(self.fail_probe, "kubectl get nodes")
    }

    async fn set_image(
        &self,
        target: &DeploymentTarget,
        image: &ImageReference,
        env: &StageEnv,
    ) -> Result<CommandOutput, ToolError> {
        self.record(format!("set-image {} {}", target.deployment, image), Some(env));
        Self::outcome(self.fail_set_image, "kubectl set image")?;
        self.state.lock().unwrap().deployed = Some(image.to_string());
        Ok(CommandOutput::default())
    }
}

/// Context rooted at `workspace` for revision `revision`
pub fn run_context(
    workspace: &Path,
    revision: &str,
    logs: Arc<dyn crate::service::LogBufferService>,
) -> crate::context::RunContext {
    crate::context::RunContext::new(
        uuid::Uuid::new_v4(),
        Revision::parse(revision).unwrap(),
        "repo",
        "demo-cluster",
        DeploymentTarget::default(),
        crate::context::RunPaths {
            workspace: workspace.to_path_buf(),
            build_context: workspace.join("src"),
            tools: workspace.join("tools"),
        },
        StageEnv::new(),
        logs,
    )
}
