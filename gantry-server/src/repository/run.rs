//! Run Repository
//!
//! Handles all database operations related to runs.

use gantry_core::domain::revision::Revision;
use gantry_core::domain::run::{Run, RunFailure, RunResult, RunStatus};
use gantry_core::domain::scan::ScanVerdict;
use gantry_core::domain::stage::{FailureKind, StageKind};
use sqlx::PgPool;
use uuid::Uuid;

const RUN_COLUMNS: &str = r#"
    id, revision, status, requested_at, started_at, completed_at,
    result_success, result_image, scan_passed, scan_report,
    failure_stage, failure_kind, failure_reason
"#;

/// Create a new queued run
pub async fn create(pool: &PgPool, revision: Revision) -> Result<Run, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = chrono::Utc::now();

    sqlx::query(
        r#"
        INSERT INTO runs (id, revision, status, requested_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(id)
    .bind(revision.as_str())
    .bind(status_to_string(RunStatus::Queued))
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Run {
        id,
        revision,
        status: RunStatus::Queued,
        requested_at: now,
        started_at: None,
        completed_at: None,
        result: None,
    })
}

/// Find a run by ID
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Run>, sqlx::Error> {
    let row = sqlx::query_as::<_, RunRow>(&format!(
        "SELECT {} FROM runs WHERE id = $1",
        RUN_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Run::try_from).transpose()
}

/// List all runs, newest first
pub async fn list_all(pool: &PgPool) -> Result<Vec<Run>, sqlx::Error> {
    let rows = sqlx::query_as::<_, RunRow>(&format!(
        "SELECT {} FROM runs ORDER BY requested_at DESC",
        RUN_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Run::try_from).collect()
}

pub async fn update_status_to_running(pool: &PgPool, run_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE runs
        SET status = $1, started_at = $2
        WHERE id = $3
        "#,
    )
    .bind(status_to_string(RunStatus::Running))
    .bind(chrono::Utc::now())
    .bind(run_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Record the final result and the terminal status it implies
pub async fn complete(pool: &PgPool, run_id: Uuid, result: &RunResult) -> Result<(), sqlx::Error> {
    let failure = result.failure.as_ref();

    sqlx::query(
        r#"
        UPDATE runs
        SET status = $1, completed_at = $2, result_success = $3, result_image = $4,
            scan_passed = $5, scan_report = $6,
            failure_stage = $7, failure_kind = $8, failure_reason = $9
        WHERE id = $10
        "#,
    )
    .bind(status_to_string(result.status()))
    .bind(chrono::Utc::now())
    .bind(result.success)
    .bind(result.image.as_deref())
    .bind(result.scan.as_ref().map(|scan| scan.passed))
    .bind(result.scan.as_ref().map(|scan| scan.report.as_str()))
    .bind(failure.map(|f| f.stage.as_str()))
    .bind(failure.map(|f| f.kind.as_str()))
    .bind(failure.map(|f| f.reason.as_str()))
    .bind(run_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Mark every run that never reached a terminal status as failed
///
/// Returns the number of runs that were closed.
pub async fn fail_unfinished(pool: &PgPool, reason: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE runs
        SET status = $1, completed_at = $2, result_success = FALSE, failure_reason = $3
        WHERE status = ANY($4)
        "#,
    )
    .bind(status_to_string(RunStatus::Failed))
    .bind(chrono::Utc::now())
    .bind(reason)
    .bind(unfinished_statuses())
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

// =============================================================================
// Helper Functions
// =============================================================================

const ALL_STATUSES: [RunStatus; 4] = [
    RunStatus::Queued,
    RunStatus::Running,
    RunStatus::Succeeded,
    RunStatus::Failed,
];

fn unfinished_statuses() -> Vec<String> {
    ALL_STATUSES
        .into_iter()
        .filter(|status| !status.is_terminal())
        .map(|status| status_to_string(status).to_string())
        .collect()
}

fn status_to_string(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Queued => "Queued",
        RunStatus::Running => "Running",
        RunStatus::Succeeded => "Succeeded",
        RunStatus::Failed => "Failed",
    }
}

fn string_to_status(s: &str) -> RunStatus {
    match s {
        "Queued" => RunStatus::Queued,
        "Running" => RunStatus::Running,
        "Succeeded" => RunStatus::Succeeded,
        _ => RunStatus::Failed,
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct RunRow {
    id: Uuid,
    revision: String,
    status: String,
    requested_at: chrono::DateTime<chrono::Utc>,
    started_at: Option<chrono::DateTime<chrono::Utc>>,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
    result_success: Option<bool>,
    result_image: Option<String>,
    scan_passed: Option<bool>,
    scan_report: Option<String>,
    failure_stage: Option<String>,
    failure_kind: Option<String>,
    failure_reason: Option<String>,
}

impl TryFrom<RunRow> for Run {
    type Error = sqlx::Error;

    fn try_from(row: RunRow) -> Result<Self, Self::Error> {
        let revision =
            Revision::parse(row.revision).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let status = string_to_status(&row.status);

        let failure = row
            .failure_kind
            .as_deref()
            .and_then(FailureKind::parse)
            .map(|kind| RunFailure {
                stage: row
                    .failure_stage
                    .as_deref()
                    .and_then(StageKind::parse)
                    .unwrap_or_else(|| kind.stage()),
                kind,
                reason: row.failure_reason.unwrap_or_default(),
            });

        let scan = row.scan_passed.map(|passed| ScanVerdict {
            passed,
            report: row.scan_report.unwrap_or_default(),
        });

        let result = row.result_success.map(|success| RunResult {
            success,
            image: row.result_image,
            scan,
            failure,
        });

        Ok(Run {
            id: row.id,
            revision,
            status,
            requested_at: row.requested_at,
            started_at: row.started_at,
            completed_at: row.completed_at,
            result,
        })
    }
}
