//! sotto command-line front end

mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use sotto_core::{paths, JsonSettingsStore};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings_path = cli.settings.clone().unwrap_or_else(paths::settings_file);
    let settings = JsonSettingsStore::open(&settings_path)
        .with_context(|| format!("Failed to open settings at {}", settings_path.display()))?;

    match cli.command {
        Commands::Models { action } => commands::models::run(action).await,
        Commands::Polish(args) => commands::polish::run(args, &settings).await,
    }
}

/// Log to stderr so command output on stdout stays clean
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
