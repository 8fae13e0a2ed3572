use async_trait::async_trait;
use gantry_core::domain::stage::StageKind;
use std::sync::Arc;

use super::Stage;
use crate::collaborators::ToolInstaller;
use crate::context::{ENV_SCANNER, RunContext};
use crate::error::PipelineError;

/// Installs the auxiliary tooling the build stage needs
pub struct InstallStage {
    tools: Arc<dyn ToolInstaller>,
}

impl InstallStage {
    pub fn new(tools: Arc<dyn ToolInstaller>) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl Stage for InstallStage {
    fn kind(&self) -> StageKind {
        StageKind::Install
    }

    async fn run(&self, ctx: &mut RunContext) -> Result<(), PipelineError> {
        ctx.log_info("Installing scanner");

        let path = self
            .tools
            .install(&ctx.paths.tools)
            .await
            .map_err(|e| PipelineError::EnvironmentSetup(e.to_string()))?;

        ctx.log_info(format!("Scanner installed at {}", path.display()));
        ctx.set_env(ENV_SCANNER, path.to_string_lossy());
        ctx.scanner_path = Some(path);
        Ok(())
    }
}
