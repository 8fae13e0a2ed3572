//! Revision poller
//!
//! Polls the head of a branch with `git ls-remote` and executes one run for
//! every head it has not seen yet, the first observed head included. Runs
//! started here are sequential; a poll cycle waits for its run to finish.

use anyhow::{Context, Result};
use gantry_core::domain::log::LogEntry;
use gantry_core::domain::revision::Revision;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::time;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::PollerConfig;
use crate::execution::RunReport;
use crate::process::{CommandSpec, ProcessRunner};
use crate::service::{ExecutionService, InMemoryLogBuffer, LogBufferService};

/// Branch watcher that triggers a run per new head
pub struct RevisionPoller {
    config: PollerConfig,
    process: Arc<dyn ProcessRunner>,
    executor: Arc<dyn ExecutionService>,
    log_dir: PathBuf,
    last_seen: Option<String>,
}

impl RevisionPoller {
    pub fn new(
        config: PollerConfig,
        process: Arc<dyn ProcessRunner>,
        executor: Arc<dyn ExecutionService>,
        log_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config,
            process,
            executor,
            log_dir: log_dir.into(),
            last_seen: None,
        }
    }

    /// Starts the polling loop
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "Watching {} ({}) every {:?}",
            self.config.source_url, self.config.branch, self.config.poll_interval
        );

        let mut interval = time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            debug!("Polling {}", self.config.branch);

            match self.poll_once().await {
                Ok(Some(report)) => {
                    if report.success() {
                        info!("Run {} for {} succeeded", report.run_id, report.revision);
                    } else if let Some(failure) = &report.failure {
                        warn!("Run {} for {} failed: {}", report.run_id, report.revision, failure);
                    }
                }
                Ok(None) => debug!("No new revision"),
                Err(e) => error!("Error during poll cycle: {:#}", e),
            }
        }
    }

    /// Performs a single poll cycle
    ///
    /// Returns the report of the run it started, or `None` if the head did
    /// not move.
    pub async fn poll_once(&mut self) -> Result<Option<RunReport>> {
        let head = self.resolve_head().await?;
        if self.last_seen.as_deref() == Some(head.as_str()) {
            return Ok(None);
        }

        let revision = Revision::parse(&head)
            .with_context(|| format!("Branch head '{}' is not a valid revision", head))?;
        info!("New revision on {}: {}", self.config.branch, revision.short());

        // Recorded before running so a failed run is not retried every tick
        self.last_seen = Some(head);

        let run_id = Uuid::new_v4();
        let buffer = InMemoryLogBuffer::new();
        let report = self
            .executor
            .execute_run(run_id, revision, Arc::new(buffer.clone()))
            .await;

        match write_log_artifact(&self.log_dir, &report, &buffer.drain()) {
            Ok(path) => info!("Run logs written to {}", path.display()),
            Err(e) => warn!("Failed to write run logs: {:#}", e),
        }

        Ok(Some(report))
    }

    async fn resolve_head(&self) -> Result<String> {
        let git_ref = format!("refs/heads/{}", self.config.branch);
        let spec = CommandSpec::new("git").args([
            "ls-remote",
            self.config.source_url.as_str(),
            git_ref.as_str(),
        ]);

        let output = self
            .process
            .run(&spec)
            .await
            .and_then(|output| output.check("git ls-remote"))
            .context("Failed to query branch head")?;

        parse_ls_remote(&output.stdout, &git_ref)
            .with_context(|| format!("Branch '{}' not found", self.config.branch))
    }
}

/// Extracts the object id of `git_ref` from `git ls-remote` output
pub fn parse_ls_remote(output: &str, git_ref: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        let oid = parts.next()?;
        let name = parts.next()?;
        (name == git_ref && !oid.is_empty()).then(|| oid.to_string())
    })
}

/// Writes the entries of a run as JSON lines
///
/// The file is `<dir>/<tag>-<run_id>.jsonl`.
pub fn write_log_artifact(dir: &Path, report: &RunReport, entries: &[LogEntry]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join(format!("{}-{}.jsonl", report.revision, report.run_id));
    let mut file = std::io::BufWriter::new(
        std::fs::File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?,
    );

    for entry in entries {
        serde_json::to_writer(&mut file, entry).context("Failed to serialize log entry")?;
        file.write_all(b"\n")?;
    }
    file.flush()?;

    Ok(path)
}
