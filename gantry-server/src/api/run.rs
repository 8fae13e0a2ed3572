//! Run API Handlers
//!
//! HTTP endpoints for triggering runs and reading their history.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use gantry_core::domain::log::LogEntry;
use gantry_core::domain::run::Run;
use gantry_core::dto::run::{RunSummary, TriggerRun};
use uuid::Uuid;

use crate::api::error::ApiResult;
use crate::service::{log_service, run_service};
use crate::state::AppState;

/// POST /hooks/commit
/// Queue and start a run for the notified revision
pub async fn trigger_run(
    State(state): State<AppState>,
    Json(req): Json<TriggerRun>,
) -> ApiResult<(StatusCode, Json<Run>)> {
    tracing::info!("Commit notification for revision: {}", req.revision);

    let run = run_service::trigger_run(&state, req).await?;

    Ok((StatusCode::ACCEPTED, Json(run)))
}

/// GET /runs
/// List all runs, newest first
pub async fn list_runs(State(state): State<AppState>) -> ApiResult<Json<Vec<RunSummary>>> {
    tracing::debug!("Listing runs");

    let runs = run_service::list_runs(&state.pool).await?;

    Ok(Json(runs))
}

/// GET /runs/{id}
pub async fn get_run(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Run>> {
    tracing::debug!("Getting run: {}", id);

    let run = run_service::get_run(&state.pool, id).await?;

    Ok(Json(run))
}

/// GET /runs/{id}/logs
/// Captured log entries of a run, in order
pub async fn get_run_logs(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<LogEntry>>> {
    tracing::debug!("Getting logs for run: {}", id);

    // Verify run exists first
    run_service::get_run(&state.pool, id).await?;

    let logs = log_service::get_run_logs(&state.pool, id).await?;

    Ok(Json(logs))
}
