//! Local one-shot run
//!
//! Executes the pipeline in-process with configuration from the
//! environment, then prints the captured stage log and the outcome.

use anyhow::{Context, Result, anyhow};
use colored::*;
use gantry_core::domain::revision::Revision;
use gantry_runner::collaborators::{Collaborators, LocalSource};
use gantry_runner::{
    ExecutionService, InMemoryLogBuffer, LogBufferService, PipelineConfig,
    StandardExecutionService,
};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use super::display::{print_log, print_result};

pub async fn run_locally(
    revision: &str,
    context: Option<PathBuf>,
    source_url: Option<String>,
) -> Result<()> {
    let revision = Revision::parse(revision).context("Invalid revision")?;

    let mut config = PipelineConfig::from_env()?;
    if let Some(url) = source_url {
        config.source_url = Some(url);
    }
    config.validate()?;

    let collaborators = Collaborators::system(&config);
    let collaborators = match context {
        Some(dir) => {
            let dir = dir
                .canonicalize()
                .with_context(|| format!("Source directory {} not found", dir.display()))?;
            collaborators.with_source(Arc::new(LocalSource::new(dir)))
        }
        None if config.source_url.is_some() => collaborators,
        None => return Err(anyhow!("Either --context or --source-url (GANTRY_SOURCE_URL) is required")),
    };

    let executor = StandardExecutionService::new(config, collaborators);
    let buffer = InMemoryLogBuffer::new();
    let run_id = Uuid::new_v4();

    println!(
        "{} Running pipeline for {}",
        "▸".cyan(),
        revision.to_string().bold()
    );

    let report = executor
        .execute_run(run_id, revision, Arc::new(buffer.clone()))
        .await;

    print_log(&buffer.drain());

    let success = report.success();
    let result = report.into_run_result();
    print_result(&result);

    if success {
        Ok(())
    } else {
        let reason = result
            .failure
            .map(|failure| failure.reason)
            .unwrap_or_else(|| "run failed".to_string());
        Err(anyhow!(reason))
    }
}
