//! Run command - consume, process and republish records
//!
//! Builds the full pipeline from configuration and runs it until the input
//! stream ends or a shutdown signal arrives.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tokio::signal;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use sluice_config::Config;
use sluice_pipeline::{Pipeline, PipelineResult};
use sluice_processor::create_default_registry;

/// Budget for the pipeline to drain after a shutdown signal
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Run command arguments
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Construct the pipeline, log startup intent and exit without consuming
    #[arg(long)]
    pub dry_run: bool,
}

/// Run the run command
pub async fn run(args: RunArgs, config_path: PathBuf) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        config = %config_path.display(),
        "Sluice starting"
    );

    let config = Config::from_file(&config_path).context("failed to load configuration")?;

    let registry = create_default_registry();
    let pipeline = Pipeline::from_config(&config, &registry)
        .await
        .context("failed to build pipeline")?;

    if args.dry_run {
        info!(
            input_topic = %config.input.topic,
            output_topic = %config.output.topic,
            workers = pipeline.workers(),
            processors = ?pipeline.processor_names(),
            "dry run: pipeline constructed, exiting before consuming"
        );
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let mut task = tokio::spawn(pipeline.run(cancel.clone()));

    tokio::select! {
        _ = wait_for_shutdown() => {
            info!("shutdown signal received, stopping pipeline...");
            cancel.cancel();

            match tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut task).await {
                Ok(result) => finish(result)?,
                Err(_) => {
                    warn!("pipeline did not finish within timeout, aborting");
                    task.abort();
                }
            }
        }
        result = &mut task => {
            info!("input stream ended");
            finish(result)?;
        }
    }

    info!("Sluice shutdown complete");
    Ok(())
}

/// Fold a joined pipeline task into the command result
fn finish(result: Result<PipelineResult<()>, JoinError>) -> Result<()> {
    match result {
        Ok(run_result) => run_result.context("pipeline terminated with error"),
        Err(e) => Err(anyhow::anyhow!("pipeline task panicked: {e}")),
    }
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
