use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gantry_runner::collaborators::Collaborators;
use gantry_runner::{ExecutionService, PipelineConfig, StandardExecutionService};

pub mod api;
pub mod config;
pub mod db;
pub mod repository;
pub mod service;
pub mod state;

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gantry_server=debug,gantry_runner=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Gantry Server...");

    let server_config = ServerConfig::from_env()?;

    let mut pipeline_config = PipelineConfig::from_env()?;
    if pipeline_config.source_url.is_none() {
        pipeline_config.source_url = server_config.source.clone_url_http.clone();
    }
    pipeline_config.validate()?;
    if pipeline_config.source_url.is_none() {
        anyhow::bail!("GANTRY_SOURCE_URL or GANTRY_SOURCE_CLONE_URL_HTTP must be set");
    }

    tracing::info!("Connecting to database...");

    let pool = db::create_pool(&server_config.database_url)
        .await
        .context("Failed to create database pool")?;

    tracing::info!("Database connection pool created");

    db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let abandoned = repository::run_repository::fail_unfinished(
        &pool,
        "server restarted before the run finished",
    )
    .await
    .context("Failed to close unfinished runs")?;
    if abandoned > 0 {
        tracing::warn!("Marked {} unfinished runs as failed", abandoned);
    }

    let collaborators = Collaborators::system(&pipeline_config);
    let executor: Arc<dyn ExecutionService> =
        Arc::new(StandardExecutionService::new(pipeline_config, collaborators));

    let state = AppState::new(
        pool,
        executor,
        server_config.source.clone(),
        server_config.max_concurrent_runs,
    );

    // Build router with all API endpoints
    let app = api::create_router(state);

    tracing::info!("Listening on {}", server_config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&server_config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", server_config.bind_addr))?;

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
