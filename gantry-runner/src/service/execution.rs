//! Execution service
//!
//! Handles a pipeline run end to end:
//! - Preparing a fresh workspace and materializing the revision
//! - Building the run context with its named variables
//! - Executing the stages and collecting the outcome
//!
//! The workspace is discarded when the run is over, whatever the outcome.

use async_trait::async_trait;
use gantry_core::domain::log::{LogEntry, LogLevel};
use gantry_core::domain::revision::Revision;
use gantry_core::domain::stage::StageKind;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::collaborators::Collaborators;
use crate::config::PipelineConfig;
use crate::context::{RunContext, RunPaths};
use crate::error::PipelineError;
use crate::execution::RunReport;
use crate::service::log_buffer::LogBufferService;
use crate::stage::Pipeline;
use crate::workspace::BuildWorkspace;

/// Service trait for executing pipeline runs
#[async_trait]
pub trait ExecutionService: Send + Sync {
    /// Executes one run of `revision`
    ///
    /// Never fails as a whole: every failure is classified and returned in
    /// the report.
    async fn execute_run(
        &self,
        run_id: Uuid,
        revision: Revision,
        log_buffer: Arc<dyn LogBufferService>,
    ) -> RunReport;
}

/// Standard implementation of ExecutionService
pub struct StandardExecutionService {
    config: PipelineConfig,
    collaborators: Collaborators,
    pipeline: Pipeline,
}

impl StandardExecutionService {
    /// Creates a service running the standard four stages
    pub fn new(config: PipelineConfig, collaborators: Collaborators) -> Self {
        let pipeline = Pipeline::standard(&config, &collaborators);
        Self {
            config,
            collaborators,
            pipeline,
        }
    }

    /// Report for a run that never reached the first stage
    fn setup_failure(
        run_id: Uuid,
        revision: Revision,
        reason: String,
        log_buffer: &Arc<dyn LogBufferService>,
    ) -> RunReport {
        let failure = PipelineError::EnvironmentSetup(reason);
        error!("Run {} failed during setup: {}", run_id, failure);
        log_buffer.add_entry(LogEntry::new(
            LogLevel::Error,
            Some(StageKind::Install),
            failure.to_string(),
        ));

        RunReport {
            run_id,
            revision,
            image: None,
            completed: Vec::new(),
            scan: None,
            pushed: false,
            failure: Some(failure),
        }
    }
}

#[async_trait]
impl ExecutionService for StandardExecutionService {
    async fn execute_run(
        &self,
        run_id: Uuid,
        revision: Revision,
        log_buffer: Arc<dyn LogBufferService>,
    ) -> RunReport {
        info!("Starting run {} for revision {}", run_id, revision.short());
        log_buffer.add_entry(LogEntry::new(
            LogLevel::Info,
            None,
            format!("Starting run for revision {}", revision),
        ));

        let workspace = match BuildWorkspace::create(&self.config.workspace_root, run_id) {
            Ok(workspace) => workspace,
            Err(e) => {
                return Self::setup_failure(
                    run_id,
                    revision,
                    format!("failed to prepare workspace: {}", e),
                    &log_buffer,
                );
            }
        };

        let source_root = match self
            .collaborators
            .source
            .materialize(&revision, &workspace.source_dir())
            .await
        {
            Ok(root) => root,
            Err(e) => {
                let reason = format!("failed to fetch revision {}: {}", revision, e);
                return Self::setup_failure(
                    run_id,
                    revision,
                    reason,
                    &log_buffer,
                );
            }
        };

        let paths = RunPaths {
            workspace: workspace.path().to_path_buf(),
            build_context: source_root.join(&self.config.build_context),
            tools: workspace.tools_dir(),
        };

        let mut ctx = RunContext::new(
            run_id,
            revision,
            self.config.registry_uri.clone(),
            self.config.cluster_name.clone(),
            self.config.target.clone(),
            paths,
            self.config.extra_env.clone(),
            log_buffer.clone(),
        );

        let outcome = self.pipeline.execute(&mut ctx).await;
        drop(workspace);

        match &outcome.failure {
            None => {
                info!("Run {} completed successfully", run_id);
                ctx.log_info("Pipeline completed successfully");
            }
            Some(e) => {
                info!("Run {} failed with {}", run_id, e.kind());
            }
        }

        RunReport {
            run_id,
            revision: ctx.revision,
            image: ctx.image,
            completed: outcome.completed,
            scan: ctx.scan_verdict,
            pushed: ctx.pushed,
            failure: outcome.failure,
        }
    }
}
