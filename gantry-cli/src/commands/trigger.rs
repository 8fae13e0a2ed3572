use anyhow::{Context, Result};
use colored::*;
use gantry_client::GantryClient;
use gantry_core::dto::run::TriggerRun;

use crate::config::Config;

/// Notify the server of a new revision
pub async fn trigger_run(config: &Config, revision: String, reference: Option<String>) -> Result<()> {
    let client = GantryClient::new(&config.server_url);

    let run = client
        .trigger_run(TriggerRun {
            revision,
            reference,
            repository: None,
        })
        .await
        .context("Failed to trigger run")?;

    println!("{} Run queued", "✓".green());
    println!("  ID:       {}", run.id.to_string().cyan());
    println!("  Revision: {}", run.revision);
    println!(
        "  {}",
        format!("Follow with: gantry runs get {}", &run.id.to_string()[..8]).dimmed()
    );

    Ok(())
}
