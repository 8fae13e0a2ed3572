//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod display;
mod info;
mod run;
mod runs;
mod trigger;

pub use runs::RunsCommands;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the pipeline locally for one revision
    Run {
        /// Revision to build (used verbatim as the image tag)
        revision: String,

        /// Build from this source checkout instead of cloning
        #[arg(long)]
        context: Option<PathBuf>,

        /// Git URL to clone the revision from
        #[arg(long)]
        source_url: Option<String>,
    },
    /// Notify the server of a new revision
    Trigger {
        /// Revision to build
        revision: String,

        /// Reference the revision was pushed to
        #[arg(long)]
        reference: Option<String>,
    },
    /// Run history on the server
    Runs {
        #[command(subcommand)]
        command: RunsCommands,
    },
    /// Show the source repository the server builds
    Info,
}

/// Routes the command to the appropriate handler module
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Run {
            revision,
            context,
            source_url,
        } => run::run_locally(&revision, context, source_url).await,
        Commands::Trigger {
            revision,
            reference,
        } => trigger::trigger_run(config, revision, reference).await,
        Commands::Runs { command } => runs::handle_runs_command(command, config).await,
        Commands::Info => info::show_info(config).await,
    }
}
