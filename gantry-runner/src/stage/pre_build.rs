use async_trait::async_trait;
use gantry_core::domain::image::ImageReference;
use gantry_core::domain::stage::StageKind;
use std::sync::Arc;

use super::Stage;
use crate::context::{ENV_IMAGE, ENV_TAG, RunContext};
use crate::error::PipelineError;
use crate::process::{CommandSpec, ProcessRunner};

/// Derives the image reference and prepares credentials
///
/// The optional bootstrap command runs with the stage environment in the
/// run workspace. Any failure here is an authentication failure: nothing has
/// been built yet and the cluster has not been touched.
pub struct PreBuildStage {
    process: Arc<dyn ProcessRunner>,
    bootstrap: Option<String>,
}

impl PreBuildStage {
    pub fn new(process: Arc<dyn ProcessRunner>, bootstrap: Option<String>) -> Self {
        Self { process, bootstrap }
    }

    async fn bootstrap(&self, command: &str, ctx: &RunContext) -> Result<(), PipelineError> {
        ctx.log_info("Running bootstrap command");

        let spec = CommandSpec::shell(command)
            .cwd(&ctx.paths.workspace)
            .envs(ctx.env());

        let output = self
            .process
            .run(&spec)
            .await
            .and_then(|output| output.check("bootstrap"))
            .map_err(|e| PipelineError::Authentication(e.to_string()))?;

        ctx.log_output(&output.stdout, &output.stderr);
        Ok(())
    }
}

#[async_trait]
impl Stage for PreBuildStage {
    fn kind(&self) -> StageKind {
        StageKind::PreBuild
    }

    async fn run(&self, ctx: &mut RunContext) -> Result<(), PipelineError> {
        let image = ImageReference::for_revision(ctx.registry_uri.clone(), &ctx.revision);

        ctx.set_env(ENV_TAG, image.tag.clone());
        ctx.set_env(ENV_IMAGE, image.to_string());
        ctx.log_info(format!("Image: {}", image));
        for (key, value) in ctx.env() {
            ctx.log_debug(format!("{}={}", key, value));
        }
        ctx.image = Some(image);

        if let Some(command) = &self.bootstrap {
            self.bootstrap(command, ctx).await?;
        }

        Ok(())
    }
}
