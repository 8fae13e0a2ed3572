//! Run history commands

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use gantry_client::GantryClient;

use super::display::{print_log, print_run_details, print_run_summary};
use crate::config::Config;
use crate::id_resolver::{explain_missing, resolve_run_id};
use crate::types::IdOrPrefix;

/// Runs subcommands
#[derive(Subcommand)]
pub enum RunsCommands {
    /// List all runs, newest first
    List,
    /// Get run details
    Get {
        /// Run ID or unambiguous prefix
        id: String,
    },
    /// Get run logs
    Logs {
        /// Run ID or unambiguous prefix
        id: String,
    },
}

pub async fn handle_runs_command(command: RunsCommands, config: &Config) -> Result<()> {
    let client = GantryClient::new(&config.server_url);

    match command {
        RunsCommands::List => list_runs(&client).await,
        RunsCommands::Get { id } => get_run(&client, &id).await,
        RunsCommands::Logs { id } => get_run_logs(&client, &id).await,
    }
}

async fn list_runs(client: &GantryClient) -> Result<()> {
    let runs = client.list_runs().await?;

    if runs.is_empty() {
        println!("{}", "No runs found.".yellow());
    } else {
        println!("{}", format!("Found {} run(s):", runs.len()).bold());
        println!();
        for run in &runs {
            print_run_summary(run);
        }
    }

    Ok(())
}

async fn get_run(client: &GantryClient, id: &str) -> Result<()> {
    let uuid = resolve_run_id(client, &IdOrPrefix::parse(id)).await?;

    let run = client
        .get_run(uuid)
        .await
        .map_err(|e| explain_missing(e, uuid))?;
    print_run_details(&run);

    Ok(())
}

async fn get_run_logs(client: &GantryClient, id: &str) -> Result<()> {
    let uuid = resolve_run_id(client, &IdOrPrefix::parse(id)).await?;

    let logs = client
        .get_run_logs(uuid)
        .await
        .map_err(|e| explain_missing(e, uuid))?;

    if logs.is_empty() {
        println!("{}", "No logs found for this run.".yellow());
    } else {
        println!("{}", format!("Logs for run {}:", uuid).bold());
        print_log(&logs);
    }

    Ok(())
}
