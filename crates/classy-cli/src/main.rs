//! Classy CLI - Command-line interface for Classy Taxi entitlement resolution.

use classy_cli::commands;
use classy_cli::repl;
use classy_cli::{Cli, Command, Config, Formatter};
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize tracing (log to stderr, RUST_LOG overrides the level)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> classy_cli::Result<()> {
    let cli = Cli::parse();

    // An explicit config path must load; the default one falls back to defaults
    let config = match cli.config.as_deref() {
        Some(path) => Config::load(Some(Path::new(path)))?,
        None => Config::load(None).unwrap_or_else(|e| {
            tracing::warn!("Using default configuration: {}", e);
            Config::default()
        }),
    };

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        None | Some(Command::Session) => {
            repl::run_session(&config, &formatter).await?;
        }
        Some(Command::Resolve(args)) => {
            commands::execute_resolve(args, &formatter)?;
        }
        Some(Command::Otp(args)) => {
            commands::execute_otp(args, &formatter)?;
        }
    }

    Ok(())
}
