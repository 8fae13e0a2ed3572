//! Build, scan and push
//!
//! The image is built, the registry session refreshed, the image scanned and
//! the report written to `<workspace>/<tag>.txt`. The gate reads that file
//! back; the push happens only when the gate passes. A missing, empty or
//! unreadable report fails the gate.

use async_trait::async_trait;
use gantry_core::domain::stage::StageKind;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use super::Stage;
use crate::collaborators::{ImageBuilder, Registry, Scanner};
use crate::context::RunContext;
use crate::error::PipelineError;
use crate::gate::ScanGate;

pub struct BuildStage {
    builder: Arc<dyn ImageBuilder>,
    registry: Arc<dyn Registry>,
    scanner: Arc<dyn Scanner>,
    gate: ScanGate,
}

impl BuildStage {
    pub fn new(
        builder: Arc<dyn ImageBuilder>,
        registry: Arc<dyn Registry>,
        scanner: Arc<dyn Scanner>,
        gate: ScanGate,
    ) -> Self {
        Self {
            builder,
            registry,
            scanner,
            gate,
        }
    }

    async fn remove_stale_report(path: &Path) -> Result<(), PipelineError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PipelineError::BuildOrScan(format!(
                "failed to remove stale report {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

#[async_trait]
impl Stage for BuildStage {
    fn kind(&self) -> StageKind {
        StageKind::Build
    }

    async fn run(&self, ctx: &mut RunContext) -> Result<(), PipelineError> {
        ctx.build_succeeding = false;

        let image = ctx.image.clone().ok_or_else(|| {
            PipelineError::BuildOrScan("image reference was not derived".to_string())
        })?;
        let scanner_path = ctx
            .scanner_path
            .clone()
            .ok_or_else(|| PipelineError::BuildOrScan("scanner is not installed".to_string()))?;

        ctx.log_info(format!("Building {}", image));
        let output = self
            .builder
            .build(&ctx.paths.build_context, &image, ctx.env())
            .await
            .map_err(|e| PipelineError::BuildOrScan(format!("image build failed: {}", e)))?;
        ctx.log_output(&output.stdout, &output.stderr);

        ctx.log_info("Logging in to registry");
        self.registry
            .login(ctx.env())
            .await
            .map_err(|e| PipelineError::BuildOrScan(format!("registry login failed: {}", e)))?;

        let report_path = ctx.paths.workspace.join(format!("{}.txt", image.tag));
        Self::remove_stale_report(&report_path).await?;

        ctx.log_info(format!("Scanning {}", image));
        match self.scanner.scan(&scanner_path, &image, ctx.env()).await {
            Ok(report) => {
                tokio::fs::write(&report_path, report).await.map_err(|e| {
                    PipelineError::BuildOrScan(format!(
                        "failed to write report {}: {}",
                        report_path.display(),
                        e
                    ))
                })?;
            }
            Err(e) => {
                warn!("Scanner produced no report for {}: {}", image, e);
                ctx.log_warning(format!("Scanner produced no report: {}", e));
            }
        }
        ctx.scan_report = Some(report_path.clone());

        let verdict = self.gate.evaluate_artifact(&report_path);
        if !verdict.report.trim().is_empty() {
            ctx.log_info(verdict.report.trim_end());
        }
        let passed = verdict.passed;
        ctx.scan_verdict = Some(verdict);

        if !passed {
            return Err(PipelineError::BuildOrScan(format!(
                "scan of {} did not report '{}'; image was not pushed",
                image,
                self.gate.pass_phrase()
            )));
        }
        ctx.log_info("Image scan passed");

        ctx.log_info(format!("Pushing {}", image));
        let output = self
            .registry
            .push(&image, ctx.env())
            .await
            .map_err(|e| PipelineError::BuildOrScan(format!("push of {} failed: {}", image, e)))?;
        ctx.log_output(&output.stdout, &output.stderr);

        ctx.pushed = true;
        ctx.build_succeeding = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::InMemoryLogBuffer;
    use crate::testing::{FakeWorld, ScanBehavior, run_context};
    use gantry_core::domain::image::ImageReference;

    fn stage(world: &Arc<FakeWorld>) -> BuildStage {
        BuildStage::new(
            world.clone(),
            world.clone(),
            world.clone(),
            ScanGate::default(),
        )
    }

    fn prepared(dir: &Path, revision: &str) -> RunContext {
        let mut ctx = run_context(dir, revision, Arc::new(InMemoryLogBuffer::new()));
        ctx.image = Some(ImageReference::for_revision("repo", &ctx.revision));
        ctx.scanner_path = Some(dir.join("tools").join("inline_scan.sh"));
        ctx
    }

    #[tokio::test]
    async fn test_pass_pushes_once() {
        let dir = tempfile::tempdir().unwrap();
        let world = Arc::new(FakeWorld::passing());
        let mut ctx = prepared(dir.path(), "abc123");

        stage(&world).run(&mut ctx).await.unwrap();

        assert_eq!(
            world.events(),
            vec![
                "build repo:abc123",
                "login",
                "scan repo:abc123",
                "push repo:abc123"
            ]
        );
        assert!(ctx.pushed);
        assert!(ctx.build_succeeding);
        assert!(dir.path().join("abc123.txt").is_file());
    }

    #[tokio::test]
    async fn test_fail_report_blocks_push() {
        let dir = tempfile::tempdir().unwrap();
        let world = Arc::new(FakeWorld::new(ScanBehavior::Report(
            "Status is FAIL".to_string(),
        )));
        let mut ctx = prepared(dir.path(), "def456");

        let err = stage(&world).run(&mut ctx).await.unwrap_err();

        assert!(matches!(err, PipelineError::BuildOrScan(_)));
        assert!(world.registry().is_empty());
        assert!(!ctx.pushed);
        assert!(!ctx.build_succeeding);
        assert!(!ctx.scan_verdict.unwrap().passed);
    }

    #[tokio::test]
    async fn test_scanner_error_removes_stale_pass() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ghi789.txt"), "status is pass").unwrap();
        let world = Arc::new(FakeWorld::new(ScanBehavior::Error));
        let mut ctx = prepared(dir.path(), "ghi789");

        let err = stage(&world).run(&mut ctx).await.unwrap_err();

        assert!(matches!(err, PipelineError::BuildOrScan(_)));
        assert!(!dir.path().join("ghi789.txt").exists());
        assert!(world.registry().is_empty());
    }

    #[tokio::test]
    async fn test_build_failure_skips_scan() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = FakeWorld::passing();
        world.fail_build = true;
        let world = Arc::new(world);
        let mut ctx = prepared(dir.path(), "abc123");

        let err = stage(&world).run(&mut ctx).await.unwrap_err();

        assert!(matches!(err, PipelineError::BuildOrScan(_)));
        assert_eq!(world.events(), vec!["build repo:abc123"]);
    }

    #[tokio::test]
    async fn test_login_failure_skips_scan_and_push() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = FakeWorld::passing();
        world.fail_login = true;
        let world = Arc::new(world);
        let mut ctx = prepared(dir.path(), "abc123");

        let err = stage(&world).run(&mut ctx).await.unwrap_err();

        assert!(matches!(err, PipelineError::BuildOrScan(_)));
        assert_eq!(world.events(), vec!["build repo:abc123", "login"]);
        assert!(world.registry().is_empty());
        assert!(ctx.scan_verdict.is_none());
        assert!(!ctx.build_succeeding);
    }

    #[tokio::test]
    async fn test_push_failure_leaves_build_unhealthy() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = FakeWorld::passing();
        world.fail_push = true;
        let world = Arc::new(world);
        let mut ctx = prepared(dir.path(), "abc123");

        let err = stage(&world).run(&mut ctx).await.unwrap_err();

        assert!(matches!(err, PipelineError::BuildOrScan(_)));
        assert!(!ctx.pushed);
        assert!(!ctx.build_succeeding);
    }

    #[tokio::test]
    async fn test_missing_image_is_build_failure() {
        let dir = tempfile::tempdir().unwrap();
        let world = Arc::new(FakeWorld::passing());
        let mut ctx = run_context(dir.path(), "abc123", Arc::new(InMemoryLogBuffer::new()));

        let err = stage(&world).run(&mut ctx).await.unwrap_err();

        assert!(matches!(err, PipelineError::BuildOrScan(_)));
        assert!(world.events().is_empty());
    }
}
