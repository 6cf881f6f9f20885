//! tablecheck: verify browser-rendered data tables against JSON fixtures
//!
//! ## Usage
//!
//! ```bash
//! tablecheck validate --config suite.yaml       # Parse suite, load fixtures
//! tablecheck run --config suite.yaml --strict   # Verify every table
//! tablecheck page-size --records 30             # Show the page size chosen
//! ```

use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tablecheck::{choose_page_size, EngineSettings, SuiteReport, DEFAULT_PAGE_SIZE_OPTIONS};
use tablecheck_cli::{
    logging, Cli, CliConfig, CliError, CliResult, Commands, PageSizeArgs, Printer, RunArgs,
    SuiteConfig, ValidateArgs, Verbosity,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    config.color.apply();

    match cli.command {
        Commands::Run(args) => run_suite(&config, &args),
        Commands::Validate(args) => run_validate(&config, &args),
        Commands::PageSize(args) => run_page_size(&config, &args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.verbose, cli.quiet))
        .with_color(cli.color.into())
}

fn load_suite(path: &Path, base_url: Option<&str>) -> CliResult<SuiteConfig> {
    let mut suite = SuiteConfig::load(path)?;
    if let Some(base_url) = base_url {
        suite = suite.with_base_url(base_url);
    }
    suite.validate()?;
    Ok(suite)
}

fn run_validate(config: &CliConfig, args: &ValidateArgs) -> CliResult<()> {
    logging::init(config.verbosity, None)?;
    let suite = load_suite(&args.config, args.base_url.as_deref())?;
    suite.suite()?;

    let checks = suite.check_fixtures();
    let printer = Printer::new(config.verbosity);
    printer.fixtures(&checks);

    let broken = checks.iter().filter(|c| c.records.is_err()).count();
    if broken > 0 {
        return Err(CliError::config(format!(
            "{broken} of {} fixtures could not be loaded",
            checks.len()
        )));
    }
    printer.message(&format!(
        "{} is valid ({} tables)",
        args.config.display(),
        suite.tables.len()
    ));
    Ok(())
}

fn run_suite(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    logging::init(config.verbosity, args.log_file.as_deref())?;
    let suite_config = load_suite(&args.config, args.base_url.as_deref())?;
    let suite = suite_config.suite()?;

    let report = execute(&suite_config, &suite, args)?;
    Printer::new(config.verbosity).suite(&report);

    if let Some(path) = &args.report {
        std::fs::write(path, report.to_json()?)?;
        tracing::info!(path = %path.display(), "report written");
    }

    if args.strict && !report.passed() {
        return Err(CliError::ChecksFailed {
            failures: report.total_failures(),
            tables: report.tables.len() - report.tables_passed(),
        });
    }
    Ok(())
}

#[cfg(feature = "browser")]
fn execute(
    suite_config: &SuiteConfig,
    suite: &tablecheck::Suite,
    args: &RunArgs,
) -> CliResult<SuiteReport> {
    use tablecheck::{ChromiumDriver, RunContext};

    let headless = suite_config.browser.headless && !args.headed;
    let browser = suite_config.browser.clone().with_headless(headless);
    let driver = ChromiumDriver::launch(&browser)?;
    let mut ctx = RunContext::new(driver)
        .with_settings(suite_config.settings.clone())
        .with_contract(suite_config.contract.clone());
    Ok(suite.run(&mut ctx))
}

#[cfg(not(feature = "browser"))]
fn execute(
    _suite_config: &SuiteConfig,
    _suite: &tablecheck::Suite,
    _args: &RunArgs,
) -> CliResult<SuiteReport> {
    Err(CliError::BrowserUnavailable)
}

fn run_page_size(config: &CliConfig, args: &PageSizeArgs) -> CliResult<()> {
    let options = if args.options.is_empty() {
        DEFAULT_PAGE_SIZE_OPTIONS.to_vec()
    } else {
        args.options.clone()
    };
    EngineSettings::new()
        .with_page_size_options(options.clone())
        .validate()
        .map_err(|e| CliError::invalid_argument(e.to_string()))?;

    let chosen = choose_page_size(args.records, &options)
        .ok_or_else(|| CliError::invalid_argument("no page-size options"))?;
    if chosen > args.records {
        println!("{chosen}");
    } else {
        println!("{chosen} (fallback: no option exceeds {} records)", args.records);
    }
    if config.verbosity.is_verbose() {
        println!("options: {options:?}");
    }
    Ok(())
}
