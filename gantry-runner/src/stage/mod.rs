//! Pipeline stages
//!
//! A run is a fixed sequence of stages sharing one [`RunContext`]. The first
//! stage that fails halts the run; nothing after it executes and nothing
//! before it is undone.

mod build;
mod install;
mod post_build;
mod pre_build;

pub use build::BuildStage;
pub use install::InstallStage;
pub use post_build::PostBuildStage;
pub use pre_build::PreBuildStage;

use async_trait::async_trait;
use gantry_core::domain::stage::StageKind;
use tracing::{error, info};

use crate::collaborators::Collaborators;
use crate::config::PipelineConfig;
use crate::context::RunContext;
use crate::error::PipelineError;
use crate::gate::ScanGate;

/// One step of a run
#[async_trait]
pub trait Stage: Send + Sync {
    fn kind(&self) -> StageKind;

    /// Executes the stage against the shared context
    async fn run(&self, ctx: &mut RunContext) -> Result<(), PipelineError>;
}

/// What happened when a pipeline was executed
#[derive(Debug)]
pub struct PipelineOutcome {
    /// Stages that ran to completion, in order
    pub completed: Vec<StageKind>,
    /// The error that halted the run, if any
    pub failure: Option<PipelineError>,
}

impl PipelineOutcome {
    pub fn success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Ordered list of stages
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// install, pre_build, build, post_build
    pub fn standard(config: &PipelineConfig, collaborators: &Collaborators) -> Self {
        Self::new(vec![
            Box::new(InstallStage::new(collaborators.tools.clone())),
            Box::new(PreBuildStage::new(
                collaborators.process.clone(),
                config.bootstrap_command.clone(),
            )),
            Box::new(BuildStage::new(
                collaborators.builder.clone(),
                collaborators.registry.clone(),
                collaborators.scanner.clone(),
                ScanGate::new(config.pass_phrase.clone()),
            )),
            Box::new(PostBuildStage::new(collaborators.cluster.clone())),
        ])
    }

    pub fn kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(|s| s.kind()).collect()
    }

    /// Runs every stage in order, stopping at the first failure
    pub async fn execute(&self, ctx: &mut RunContext) -> PipelineOutcome {
        let mut completed = Vec::with_capacity(self.stages.len());

        for (idx, stage) in self.stages.iter().enumerate() {
            let kind = stage.kind();
            info!(
                "Executing stage {}/{}: {}",
                idx + 1,
                self.stages.len(),
                kind
            );

            ctx.enter_stage(Some(kind));
            ctx.log_info(format!("Starting stage: {}", kind));

            if let Err(e) = stage.run(ctx).await {
                error!("Run {} halted in {}: {}", ctx.run_id, kind, e);
                ctx.log_error(e.to_string());
                ctx.enter_stage(None);
                return PipelineOutcome {
                    completed,
                    failure: Some(e),
                };
            }

            ctx.log_info(format!("Stage '{}' completed", kind));
            completed.push(kind);
        }

        ctx.enter_stage(None);
        PipelineOutcome {
            completed,
            failure: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RunPaths;
    use crate::service::{InMemoryLogBuffer, LogBufferService};
    use gantry_core::domain::deployment::DeploymentTarget;
    use gantry_core::domain::revision::Revision;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    struct Step {
        kind: StageKind,
        fail: bool,
        seen: Arc<Mutex<Vec<StageKind>>>,
    }

    #[async_trait]
    impl Stage for Step {
        fn kind(&self) -> StageKind {
            self.kind
        }

        async fn run(&self, ctx: &mut RunContext) -> Result<(), PipelineError> {
            self.seen.lock().unwrap().push(self.kind);
            ctx.log_info("working");
            if self.fail {
                Err(PipelineError::Authentication("denied".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn context(buffer: &InMemoryLogBuffer) -> RunContext {
        RunContext::new(
            Uuid::new_v4(),
            Revision::parse("abc123").unwrap(),
            "repo",
            "demo",
            DeploymentTarget::default(),
            RunPaths {
                workspace: PathBuf::from("/tmp/ws"),
                build_context: PathBuf::from("/tmp/ws/src"),
                tools: PathBuf::from("/tmp/ws/tools"),
            },
            BTreeMap::new(),
            Arc::new(buffer.clone()),
        )
    }

    fn pipeline(fail_at: Option<StageKind>, seen: &Arc<Mutex<Vec<StageKind>>>) -> Pipeline {
        Pipeline::new(
            StageKind::ALL
                .iter()
                .map(|kind| {
                    Box::new(Step {
                        kind: *kind,
                        fail: fail_at == Some(*kind),
                        seen: seen.clone(),
                    }) as Box<dyn Stage>
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_stages_run_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let buffer = InMemoryLogBuffer::new();
        let mut ctx = context(&buffer);

        let outcome = pipeline(None, &seen).execute(&mut ctx).await;

        assert!(outcome.success());
        assert_eq!(outcome.completed, StageKind::ALL.to_vec());
        assert_eq!(*seen.lock().unwrap(), StageKind::ALL.to_vec());
        assert_eq!(ctx.current_stage(), None);
    }

    #[tokio::test]
    async fn test_first_failure_halts_run() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let buffer = InMemoryLogBuffer::new();
        let mut ctx = context(&buffer);

        let outcome = pipeline(Some(StageKind::PreBuild), &seen)
            .execute(&mut ctx)
            .await;

        assert!(!outcome.success());
        assert_eq!(outcome.completed, vec![StageKind::Install]);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![StageKind::Install, StageKind::PreBuild]
        );

        let entries = buffer.drain();
        let last = entries.last().unwrap();
        assert_eq!(last.stage, Some(StageKind::PreBuild));
        assert!(last.message.contains("AuthenticationError"));
    }

    #[test]
    fn test_standard_pipeline_order() {
        let world = Arc::new(crate::testing::FakeWorld::passing());
        let collaborators =
            world.collaborators(Arc::new(crate::testing::RecordingProcess::new()));
        let config = PipelineConfig::new("repo", "demo", "key");

        let pipeline = Pipeline::standard(&config, &collaborators);
        assert_eq!(pipeline.kinds(), StageKind::ALL.to_vec());
    }
}
