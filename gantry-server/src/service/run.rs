//! Run Service
//!
//! Business logic for triggering runs and tracking their lifecycle.
//!
//! A triggered run is persisted as `Queued` and executed on its own task.
//! Runs are not serialized against each other; the optional admission
//! limit in [`AppState`] is the only bound.

use gantry_core::domain::log::LogEntry;
use gantry_core::domain::revision::Revision;
use gantry_core::domain::run::{Run, RunResult};
use gantry_core::dto::run::{RunSummary, TriggerRun};
use gantry_runner::{InMemoryLogBuffer, LogBufferService};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::repository::run_repository;
use crate::service::log_service;
use crate::state::AppState;

/// Service error type
#[derive(Debug)]
pub enum RunError {
    NotFound(Uuid),
    ValidationError(String),
    DatabaseError(sqlx::Error),
}

impl From<sqlx::Error> for RunError {
    fn from(err: sqlx::Error) -> Self {
        RunError::DatabaseError(err)
    }
}

impl From<log_service::LogError> for RunError {
    fn from(err: log_service::LogError) -> Self {
        match err {
            log_service::LogError::DatabaseError(err) => RunError::DatabaseError(err),
        }
    }
}

/// Record a run for the notified revision and start it
pub async fn trigger_run(state: &AppState, req: TriggerRun) -> Result<Run, RunError> {
    let revision = validate_trigger(&req)?;

    let run = run_repository::create(&state.pool, revision).await?;

    tracing::info!(
        "Run {} queued for revision {} (reference: {}, repository: {})",
        run.id,
        run.revision,
        req.reference.as_deref().unwrap_or("-"),
        req.repository.as_deref().unwrap_or("-"),
    );

    let task_state = state.clone();
    let run_id = run.id;
    let revision = run.revision.clone();
    tokio::spawn(execute_run(task_state, run_id, revision));

    Ok(run)
}

/// Get a run by ID
pub async fn get_run(pool: &PgPool, id: Uuid) -> Result<Run, RunError> {
    let run = run_repository::find_by_id(pool, id)
        .await?
        .ok_or(RunError::NotFound(id))?;

    Ok(run)
}

/// List all runs, newest first
pub async fn list_runs(pool: &PgPool) -> Result<Vec<RunSummary>, RunError> {
    let runs = run_repository::list_all(pool).await?;
    Ok(runs.into_iter().map(RunSummary::from).collect())
}

/// Persistence steps of a run's lifecycle
pub(crate) trait RunStore {
    async fn mark_running(&self, run_id: Uuid) -> Result<(), RunError>;
    async fn complete(&self, run_id: Uuid, result: &RunResult) -> Result<(), RunError>;
    async fn store_logs(&self, run_id: Uuid, entries: Vec<LogEntry>) -> Result<(), RunError>;
}

impl RunStore for PgPool {
    async fn mark_running(&self, run_id: Uuid) -> Result<(), RunError> {
        Ok(run_repository::update_status_to_running(self, run_id).await?)
    }

    async fn complete(&self, run_id: Uuid, result: &RunResult) -> Result<(), RunError> {
        Ok(run_repository::complete(self, run_id, result).await?)
    }

    async fn store_logs(&self, run_id: Uuid, entries: Vec<LogEntry>) -> Result<(), RunError> {
        Ok(log_service::add_log_entries(self, run_id, entries).await?)
    }
}

/// Executes a queued run and persists its result and logs
async fn execute_run(state: AppState, run_id: Uuid, revision: Revision) {
    let _permit = state.admit().await;

    // The run still executes; recording its result makes the row terminal.
    if let Err(e) = state.pool.mark_running(run_id).await {
        tracing::error!("Failed to mark run {} as running: {:?}", run_id, e);
    }

    let buffer = InMemoryLogBuffer::new();
    let report = state
        .executor
        .execute_run(run_id, revision, Arc::new(buffer.clone()))
        .await;

    let result = report.into_run_result();
    tracing::info!("Run {} finished with status: {:?}", run_id, result.status());

    let _ = record_outcome(&state.pool, run_id, &result, buffer.drain()).await;
}

/// Stores the result first, then the logs
///
/// Each step is attempted and logged on its own; the first error is returned.
async fn record_outcome<S: RunStore>(
    store: &S,
    run_id: Uuid,
    result: &RunResult,
    entries: Vec<LogEntry>,
) -> Result<(), RunError> {
    let completed = store.complete(run_id, result).await;
    if let Err(e) = &completed {
        tracing::error!("Failed to record result of run {}: {:?}", run_id, e);
    }

    let logged = store.store_logs(run_id, entries).await;
    if let Err(e) = &logged {
        tracing::error!("Failed to store logs of run {}: {:?}", run_id, e);
    }

    completed.and(logged)
}

// =============================================================================
// Validation
// =============================================================================

fn validate_trigger(req: &TriggerRun) -> Result<Revision, RunError> {
    Revision::parse(req.revision.trim())
        .map_err(|e| RunError::ValidationError(format!("Invalid revision: {}", e)))
}
