//! nsbox: start blockchain nodes inside the local orchestration sandbox,
//! optionally decentralize them, and record them in `services.json`.

mod cli;
mod commands;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use ns_telemetry::{init_telemetry, TelemetryConfig};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let telemetry = TelemetryConfig::from_env().with_verbose(cli.verbose);
    let _guard = init_telemetry(&telemetry).context("failed to initialize logging")?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling workflow");
            on_interrupt.cancel();
        }
    });

    let status = commands::run(cli, cancel).await?;
    Ok(ExitCode::from(status))
}
