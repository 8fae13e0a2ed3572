//! Gantry Runner
//!
//! Watches a branch and runs the build-scan-deploy pipeline for every new
//! head.
//!
//! Architecture:
//! - Configuration: pipeline and poller settings from environment variables
//! - Collaborators: container engine, scanner, kubectl and git via processes
//! - Services: run execution and log buffering
//! - Scheduler: branch polling

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gantry_runner::collaborators::Collaborators;
use gantry_runner::process::{CommandSpec, ProcessRunner, SystemProcessRunner};
use gantry_runner::scheduler::RevisionPoller;
use gantry_runner::{ExecutionService, PipelineConfig, PollerConfig, StandardExecutionService};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gantry_runner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Gantry Runner");

    let poller_config = PollerConfig::from_env()?;
    poller_config.validate()?;

    let mut config = PipelineConfig::from_env()?;
    if config.source_url.is_none() {
        config.source_url = Some(poller_config.source_url.clone());
    }
    config.validate()?;
    info!(
        "Loaded configuration: registry={}, cluster={}, target={}",
        config.registry_uri, config.cluster_name, config.target
    );

    let process: Arc<dyn ProcessRunner> = Arc::new(SystemProcessRunner);
    check_tool_available(&process, &config.container_bin, &["--version"]).await?;
    check_tool_available(&process, &config.kubectl_bin, &["version", "--client"]).await?;
    check_tool_available(&process, "git", &["--version"]).await?;

    let log_dir = config.workspace_root.join("logs");
    let collaborators = Collaborators::system(&config);
    let executor: Arc<dyn ExecutionService> =
        Arc::new(StandardExecutionService::new(config, collaborators));

    info!("Runner initialized successfully");

    let mut poller = RevisionPoller::new(poller_config, process, executor, log_dir);
    if let Err(e) = poller.run().await {
        error!("Poller error: {}", e);
        return Err(e);
    }

    Ok(())
}

/// Fails startup if a required binary cannot be run
async fn check_tool_available(
    process: &Arc<dyn ProcessRunner>,
    program: &str,
    args: &[&str],
) -> Result<()> {
    let output = process
        .run(&CommandSpec::new(program).args(args.iter().copied()))
        .await
        .and_then(|output| output.check(program))
        .with_context(|| format!("{} is not available", program))?;

    info!("Found {}: {}", program, output.stdout.lines().next().unwrap_or("").trim());
    Ok(())
}
