use anyhow::{Context, Result};
use colored::*;
use gantry_client::GantryClient;

use crate::config::Config;

/// Show the source repository the server builds
pub async fn show_info(config: &Config) -> Result<()> {
    let client = GantryClient::new(&config.server_url);
    client
        .health()
        .await
        .with_context(|| format!("Server at {} is not healthy", client.base_url()))?;
    let info = client.source_info().await?;

    let show = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

    println!("{} {}", "Server:".bold(), client.base_url().green());
    println!("{}", "Source Repository:".bold());
    println!("  Name:        {}", show(&info.repository_name).cyan());
    println!("  ID:          {}", show(&info.repository_id));
    println!("  Clone (HTTP): {}", show(&info.clone_url_http));
    println!("  Clone (SSH):  {}", show(&info.clone_url_ssh));

    Ok(())
}
