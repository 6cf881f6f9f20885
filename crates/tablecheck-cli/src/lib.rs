//! tablecheck CLI library
//!
//! Command-line front end for the tablecheck engine: YAML suite files,
//! logging setup and run summaries.

#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod config;
mod error;
pub mod logging;
mod output;
mod suite_file;

pub use commands::{Cli, ColorArg, Commands, PageSizeArgs, RunArgs, ValidateArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{render_fixture, render_suite, render_table, Printer};
pub use suite_file::{FixtureCheck, SuiteConfig, TableConfig};
