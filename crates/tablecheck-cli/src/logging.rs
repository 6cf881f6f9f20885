//! Logging configuration
//!
//! Narrative lines from the engine arrive as `tracing` events under the
//! `tablecheck::narrative` target. They are printed to stdout and, when a
//! log file is given, appended to it without ANSI escapes.

use crate::config::Verbosity;
use crate::error::{CliError, CliResult};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter: `RUST_LOG` when set, otherwise derived from verbosity
#[must_use]
pub fn filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.default_filter()))
}

/// Initialize the global subscriber
pub fn init(verbosity: Verbosity, log_file: Option<&Path>) -> CliResult<()> {
    let stdout_layer = fmt::layer()
        .with_target(verbosity.is_verbose())
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .without_time()
        .compact();

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    CliError::config(format!("cannot open log file {}: {e}", path.display()))
                })?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter(verbosity))
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::config(format!("logging already initialized: {e}")))
}
