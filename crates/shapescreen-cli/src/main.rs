mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod utils;

use crate::cli::Cli;
use crate::commands::screen::RunStatus;
use crate::error::{CliError, Result};
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    match run_app().await {
        Ok(status) => ExitCode::from(status.exit_code() as u8),
        Err(e) => {
            // Let the progress bar clear before the error lands on stderr.
            tokio::time::sleep(Duration::from_millis(50)).await;
            eprintln!("\n❌ Error: {e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run_app() -> Result<RunStatus> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone())?;
    install_report_hooks()?;

    info!(version = env!("CARGO_PKG_VERSION"), "shapescreen starting");
    debug!(?cli, "Arguments parsed");

    if let Some(threads) = cli.threads {
        configure_thread_pool(threads)?;
    }

    let outcome = commands::screen::run(cli.screen, cli.quiet).await;
    match &outcome {
        Ok(RunStatus::Completed) => info!("✅ Screen finished."),
        Ok(RunStatus::BackendUnavailable) => info!("Nothing screened: no shape backend."),
        Ok(RunStatus::Interrupted) => warn!("Screen interrupted; partial results were written."),
        Err(e) => error!(error = %e, "Screen failed"),
    }
    outcome
}

/// Routes panics through tracing so they also reach `--log-file`.
fn install_report_hooks() -> Result<()> {
    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default().into_hooks();
    eyre_hook.install().map_err(|e| CliError::Other(e.into()))?;
    std::panic::set_hook(Box::new(move |info| {
        error!("{}", panic_hook.panic_report(info));
    }));
    Ok(())
}

fn configure_thread_pool(threads: usize) -> Result<()> {
    if threads == 0 {
        return Err(CliError::Argument("--threads must be at least 1".into()));
    }
    info!(threads, "Sizing the worker pool");
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to build worker pool: {e}")))
}
