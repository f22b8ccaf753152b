//! Sluice - Kafka topic replay pipeline
//!
//! # Usage
//!
//! ```bash
//! # Run the pipeline
//! sluice run
//! sluice run --config configs/replay.yml
//!
//! # Construct everything, then exit without consuming
//! sluice run --dry-run
//!
//! # Check a configuration file
//! sluice validate --config configs/replay.yml
//! ```

mod cmd;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use sluice_config::Config;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Sluice - Kafka topic replay pipeline
#[derive(Parser, Debug)]
#[command(name = "sluice")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config.yml", env = "SLUICE_CONFIG")]
    config: PathBuf,

    /// Log level (debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the pipeline until the stream ends or a shutdown signal arrives
    Run(cmd::run::RunArgs),

    /// Check a configuration file without touching any broker
    Validate,

    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => {
            let log_level = resolve_log_level(cli.log_level.as_deref(), &cli.config);
            init_logging(&log_level)?;
            cmd::run::run(args, cli.config).await
        }
        Command::Validate => {
            // Validate reports to stdout/stderr, no logging needed
            cmd::validate::run(&cli.config)
        }
        Command::Version => {
            println!(
                "sluice {} ({} {})",
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS,
                std::env::consts::ARCH
            );
            Ok(())
        }
    }
}

/// Resolve log level: CLI flag > config file > default "info"
fn resolve_log_level(cli_level: Option<&str>, config_path: &Path) -> String {
    // CLI flag takes precedence
    if let Some(level) = cli_level {
        return level.to_string();
    }

    // Try to load from the config file if it exists
    if config_path.exists()
        && let Ok(config) = Config::from_file(config_path)
    {
        return config.log.level.as_str().to_string();
    }

    // Default
    "info".to_string()
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();

    Ok(())
}
