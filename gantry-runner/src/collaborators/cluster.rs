//! Cluster access

use async_trait::async_trait;
use gantry_core::domain::deployment::DeploymentTarget;
use gantry_core::domain::image::ImageReference;
use std::sync::Arc;
use tracing::info;

use crate::context::StageEnv;
use crate::error::ToolError;
use crate::process::{CommandOutput, CommandSpec, ProcessRunner};

/// Cluster hosting the deployment target
#[async_trait]
pub trait Cluster: Send + Sync {
    /// Read-only liveness probe
    async fn probe(&self, env: &StageEnv) -> Result<CommandOutput, ToolError>;

    /// Points the target's container at `image`
    async fn set_image(
        &self,
        target: &DeploymentTarget,
        image: &ImageReference,
        env: &StageEnv,
    ) -> Result<CommandOutput, ToolError>;
}

/// kubectl command line
pub struct Kubectl {
    process: Arc<dyn ProcessRunner>,
    binary: String,
    context: Option<String>,
}

impl Kubectl {
    pub fn new(
        process: Arc<dyn ProcessRunner>,
        binary: impl Into<String>,
        context: Option<String>,
    ) -> Self {
        Self {
            process,
            binary: binary.into(),
            context,
        }
    }

    fn base_command(&self) -> CommandSpec {
        let spec = CommandSpec::new(&self.binary);
        match &self.context {
            Some(context) => spec.arg("--context").arg(context),
            None => spec,
        }
    }

    async fn run_checked(&self, spec: CommandSpec) -> Result<CommandOutput, ToolError> {
        self.process.run(&spec).await?.check(&spec.program)
    }
}

#[async_trait]
impl Cluster for Kubectl {
    async fn probe(&self, env: &StageEnv) -> Result<CommandOutput, ToolError> {
        self.run_checked(self.base_command().args(["get", "nodes"]).envs(env))
            .await
    }

    async fn set_image(
        &self,
        target: &DeploymentTarget,
        image: &ImageReference,
        env: &StageEnv,
    ) -> Result<CommandOutput, ToolError> {
        info!("Setting image of {} to {}", target, image);

        let mut spec = self.base_command();
        if let Some(namespace) = &target.namespace {
            spec = spec.arg("-n").arg(namespace);
        }
        let spec = spec
            .args(["set", "image"])
            .arg(format!("deployment/{}", target.deployment))
            .arg(format!("{}={}", target.container, image))
            .envs(env);

        self.run_checked(spec).await
    }
}
