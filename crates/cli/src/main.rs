//! Remote control CLI entry point.
//!
//! This binary is the composition root:
//!
//! 1. **Parse configuration**: command-line options with environment
//!    fallbacks (`REMOTE_CONTROL_URL`, `REMOTE_CONTROL_USERNAME`,
//!    `REMOTE_CONTROL_PASSWORD`).
//! 2. **Wire observability**: `tracing-subscriber` with a text or JSON layer
//!    and an optional OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure**: an [`xmlrpc::HttpTransport`] for the
//!    selected server, wrapped in a [`controller::RemoteClient`].
//! 4. **Run the command**: the demonstration sequence unless another command
//!    was given. The first failure ends the run with a non-zero exit status.

mod args;
mod commands;
mod telemetry;

use std::process::ExitCode;

use clap::Parser;
use tracing::Instrument;
use uuid::Uuid;

use crate::args::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = match telemetry::init(cli.log_json) {
        Ok(telemetry) => telemetry,
        Err(err) => {
            eprintln!("remote-control: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("remote_control", %run_id);
    let result = commands::run(&cli).instrument(span).await;

    let code = match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%run_id, error = %format!("{err:#}"), "Remote control run failed");
            eprintln!("remote-control: {err:#}");
            eprintln!("{err:?}");
            ExitCode::FAILURE
        }
    };

    telemetry.shutdown();
    code
}
