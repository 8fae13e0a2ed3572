//! Image scanning

use async_trait::async_trait;
use gantry_core::domain::image::ImageReference;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::context::StageEnv;
use crate::error::ToolError;
use crate::process::{CommandSpec, ProcessRunner};

/// Scanning subsystem
#[async_trait]
pub trait Scanner: Send + Sync {
    /// Scans the locally built `image` and returns the textual report
    ///
    /// `Err` means no report could be produced at all. A report is returned
    /// even when the scanner itself signals a failed scan; judging it is the
    /// gate's job.
    async fn scan(
        &self,
        scanner: &Path,
        image: &ImageReference,
        env: &StageEnv,
    ) -> Result<String, ToolError>;
}

/// Inline scanning script (`inline_scan.sh analyze`)
pub struct InlineScanner {
    process: Arc<dyn ProcessRunner>,
    endpoint: String,
    key: String,
}

impl InlineScanner {
    pub fn new(
        process: Arc<dyn ProcessRunner>,
        endpoint: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            process,
            endpoint: endpoint.into(),
            key: key.into(),
        }
    }

    fn command(&self, scanner: &Path, image: &ImageReference) -> CommandSpec {
        CommandSpec::new(scanner.to_string_lossy())
            .arg("analyze")
            .args(["-s", self.endpoint.as_str()])
            .arg("-k")
            .secret_arg(self.key.as_str())
            .arg("-P")
            .arg(image.to_string())
    }
}

#[async_trait]
impl Scanner for InlineScanner {
    async fn scan(
        &self,
        scanner: &Path,
        image: &ImageReference,
        env: &StageEnv,
    ) -> Result<String, ToolError> {
        info!("Scanning image {} against {}", image, self.endpoint);

        let output = self.process.run(&self.command(scanner, image).envs(env)).await?;

        if !output.success() {
            warn!(
                "Scanner exited with code {} for {}, keeping its report",
                output.exit_code, image
            );
        }

        Ok(output.stdout)
    }
}
