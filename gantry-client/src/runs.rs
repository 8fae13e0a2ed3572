//! Run-related API endpoints

use crate::GantryClient;
use crate::error::Result;
use gantry_core::domain::log::LogEntry;
use gantry_core::domain::run::Run;
use gantry_core::dto::run::{RunSummary, TriggerRun};
use uuid::Uuid;

impl GantryClient {
    /// Notify the server of a new revision
    ///
    /// Returns the queued run; it executes in the background.
    pub async fn trigger_run(&self, req: TriggerRun) -> Result<Run> {
        let url = format!("{}/hooks/commit", self.base_url);
        tracing::debug!("Triggering run for revision {}", req.revision);
        let response = self.client.post(&url).json(&req).send().await?;

        self.handle_response(response).await
    }

    /// List all runs, newest first
    pub async fn list_runs(&self) -> Result<Vec<RunSummary>> {
        let url = format!("{}/runs", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Get a run by ID
    pub async fn get_run(&self, run_id: Uuid) -> Result<Run> {
        let url = format!("{}/runs/{}", self.base_url, run_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Get the captured log entries of a run
    pub async fn get_run_logs(&self, run_id: Uuid) -> Result<Vec<LogEntry>> {
        let url = format!("{}/runs/{}/logs", self.base_url, run_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
