use async_trait::async_trait;
use gantry_core::domain::stage::StageKind;
use std::sync::Arc;

use super::Stage;
use crate::collaborators::Cluster;
use crate::context::RunContext;
use crate::error::PipelineError;

/// Rolls the deployment to the freshly pushed image
///
/// Runs only when the build is healthy. A failed rollout leaves the image in
/// the registry and the deployment in whatever state the cluster reports;
/// nothing is rolled back.
pub struct PostBuildStage {
    cluster: Arc<dyn Cluster>,
}

impl PostBuildStage {
    pub fn new(cluster: Arc<dyn Cluster>) -> Self {
        Self { cluster }
    }
}

#[async_trait]
impl Stage for PostBuildStage {
    fn kind(&self) -> StageKind {
        StageKind::PostBuild
    }

    async fn run(&self, ctx: &mut RunContext) -> Result<(), PipelineError> {
        if !ctx.build_succeeding {
            return Err(PipelineError::PostBuildHealthCheck(
                "build is not healthy; deployment left unchanged".to_string(),
            ));
        }
        let image = ctx.image.clone().ok_or_else(|| {
            PipelineError::PostBuildHealthCheck("no image was produced".to_string())
        })?;

        ctx.log_info(format!("Checking cluster {}", ctx.cluster_name));
        let output = self.cluster.probe(ctx.env()).await.map_err(|e| {
            PipelineError::DeploymentUpdate(format!(
                "cluster {} is unreachable: {}",
                ctx.cluster_name, e
            ))
        })?;
        ctx.log_output(&output.stdout, &output.stderr);

        ctx.log_info(format!("Updating {} to {}", ctx.target, image));
        let output = self
            .cluster
            .set_image(&ctx.target, &image, ctx.env())
            .await
            .map_err(|e| {
                PipelineError::DeploymentUpdate(format!(
                    "failed to update {}: {}; {} remains in the registry",
                    ctx.target, e, image
                ))
            })?;
        ctx.log_output(&output.stdout, &output.stderr);

        ctx.log_info(format!("{} now runs {}", ctx.target, image));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::InMemoryLogBuffer;
    use crate::testing::{FakeWorld, run_context};
    use gantry_core::domain::image::ImageReference;
    use std::path::Path;

    fn healthy(dir: &Path) -> RunContext {
        let mut ctx = run_context(dir, "abc123", Arc::new(InMemoryLogBuffer::new()));
        ctx.image = Some(ImageReference::for_revision("repo", &ctx.revision));
        ctx.pushed = true;
        ctx.build_succeeding = true;
        ctx
    }

    #[tokio::test]
    async fn test_rollout_updates_deployment() {
        let dir = tempfile::tempdir().unwrap();
        let world = Arc::new(FakeWorld::passing());
        let mut ctx = healthy(dir.path());

        PostBuildStage::new(world.clone()).run(&mut ctx).await.unwrap();

        assert_eq!(world.events(), vec!["probe", "set-image flask repo:abc123"]);
        assert_eq!(world.deployed().as_deref(), Some("repo:abc123"));
    }

    #[tokio::test]
    async fn test_unhealthy_build_is_not_rolled_out() {
        let dir = tempfile::tempdir().unwrap();
        let world = Arc::new(FakeWorld::passing());
        let mut ctx = healthy(dir.path());
        ctx.build_succeeding = false;

        let err = PostBuildStage::new(world.clone())
            .run(&mut ctx)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::PostBuildHealthCheck(_)));
        assert!(world.events().is_empty());
        assert!(world.deployed().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_cluster_is_deployment_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = FakeWorld::passing();
        world.fail_probe = true;
        let world = Arc::new(world);
        let mut ctx = healthy(dir.path());

        let err = PostBuildStage::new(world.clone())
            .run(&mut ctx)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::DeploymentUpdate(_)));
        assert_eq!(world.events(), vec!["probe"]);
    }

    #[tokio::test]
    async fn test_set_image_failure_is_deployment_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = FakeWorld::passing();
        world.fail_set_image = true;
        let world = Arc::new(world);
        let mut ctx = healthy(dir.path());

        let err = PostBuildStage::new(world.clone())
            .run(&mut ctx)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::DeploymentUpdate(_)));
        assert!(err.to_string().contains("repo:abc123 remains in the registry"));
        assert!(world.deployed().is_none());
    }
}
