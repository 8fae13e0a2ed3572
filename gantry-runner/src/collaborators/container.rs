//! Image build and registry access through a container engine CLI

use async_trait::async_trait;
use gantry_core::domain::image::ImageReference;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::context::StageEnv;
use crate::error::ToolError;
use crate::process::{CommandOutput, CommandSpec, ProcessRunner};

/// Builds container images
#[async_trait]
pub trait ImageBuilder: Send + Sync {
    /// Builds the recipe in `context_dir` and tags it as `image`
    async fn build(
        &self,
        context_dir: &Path,
        image: &ImageReference,
        env: &StageEnv,
    ) -> Result<CommandOutput, ToolError>;
}

/// Container registry
#[async_trait]
pub trait Registry: Send + Sync {
    /// Refreshes registry credentials; called once per run, never cached
    async fn login(&self, env: &StageEnv) -> Result<(), ToolError>;

    /// Pushes `image`, overwriting an existing tag
    async fn push(&self, image: &ImageReference, env: &StageEnv)
    -> Result<CommandOutput, ToolError>;
}

/// docker/podman command line
pub struct ContainerCli {
    process: Arc<dyn ProcessRunner>,
    binary: String,
    login_command: Option<String>,
}

impl ContainerCli {
    /// # Arguments
    /// * `binary` - Container engine binary (e.g. "docker", "podman")
    /// * `login_command` - Shell command that logs the engine into the registry
    pub fn new(
        process: Arc<dyn ProcessRunner>,
        binary: impl Into<String>,
        login_command: Option<String>,
    ) -> Self {
        Self {
            process,
            binary: binary.into(),
            login_command,
        }
    }

    async fn run_checked(&self, spec: CommandSpec) -> Result<CommandOutput, ToolError> {
        self.process.run(&spec).await?.check(&spec.program)
    }
}

#[async_trait]
impl ImageBuilder for ContainerCli {
    async fn build(
        &self,
        context_dir: &Path,
        image: &ImageReference,
        env: &StageEnv,
    ) -> Result<CommandOutput, ToolError> {
        info!("Building image {} from {}", image, context_dir.display());

        let spec = CommandSpec::new(&self.binary)
            .args(["build", "-t"])
            .arg(image.to_string())
            .arg(".")
            .cwd(context_dir)
            .envs(env);

        self.run_checked(spec).await
    }
}

#[async_trait]
impl Registry for ContainerCli {
    async fn login(&self, env: &StageEnv) -> Result<(), ToolError> {
        let Some(command) = &self.login_command else {
            debug!("No registry login command configured, using ambient credentials");
            return Ok(());
        };

        info!("Refreshing registry credentials");
        self.run_checked(CommandSpec::shell(command).envs(env))
            .await
            .map(|_| ())
    }

    async fn push(
        &self,
        image: &ImageReference,
        env: &StageEnv,
    ) -> Result<CommandOutput, ToolError> {
        info!("Pushing image {}", image);

        let spec = CommandSpec::new(&self.binary)
            .arg("push")
            .arg(image.to_string())
            .envs(env);

        self.run_checked(spec).await
    }
}
