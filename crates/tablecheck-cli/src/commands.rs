//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// tablecheck: verify browser-rendered data tables against JSON fixtures
#[derive(Parser, Debug)]
#[command(name = "tablecheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (only failures and errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify every table of a suite file in a browser
    Run(RunArgs),

    /// Check a suite file and load every fixture without a browser
    Validate(ValidateArgs),

    /// Show the page size selected for a record count
    PageSize(PageSizeArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Suite file (YAML)
    #[arg(short, long, env = "TABLECHECK_CONFIG")]
    pub config: PathBuf,

    /// Base URL for relative table URLs (overrides the suite file)
    #[arg(long, env = "TABLECHECK_BASE_URL")]
    pub base_url: Option<String>,

    /// Exit non-zero when any check fails
    #[arg(long)]
    pub strict: bool,

    /// Also append log lines to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Write the suite report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Suite file (YAML)
    #[arg(short, long, env = "TABLECHECK_CONFIG")]
    pub config: PathBuf,

    /// Base URL for relative table URLs (overrides the suite file)
    #[arg(long, env = "TABLECHECK_BASE_URL")]
    pub base_url: Option<String>,
}

/// Arguments for the page-size command
#[derive(Parser, Debug)]
pub struct PageSizeArgs {
    /// Number of fixture records
    #[arg(short, long)]
    pub records: usize,

    /// Offered page sizes, ascending (defaults to 10,25,50,100,250,500,1000)
    #[arg(long, value_delimiter = ',')]
    pub options: Vec<usize>,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Use colors when stdout is a terminal
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
