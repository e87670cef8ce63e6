//! ReadyCash CLI - command-line access to the ReadyCash agent gateway.
//!
//! Sessions are cached on disk so consecutive invocations share one login
//! until it expires or the gateway revokes it.

mod commands;
mod config;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::Command;
use config::Config;

/// Directory for an optional daily log file
const ENV_LOG_DIR: &str = "READYCASH_LOG_DIR";

/// Log file prefix inside `READYCASH_LOG_DIR`
const LOG_FILE_PREFIX: &str = "readycash.log";

/// Initialize the tracing subscriber for logging.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var_os(ENV_LOG_DIR).map(PathBuf::from) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;
    debug!(?command, "Parsed command");

    let config = Config::load()?;
    info!(base_url = ?config.base_url, "ReadyCash CLI starting");

    commands::run(command, config).await
}
