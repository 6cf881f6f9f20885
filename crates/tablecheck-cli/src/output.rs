//! Output formatting

use crate::config::Verbosity;
use crate::suite_file::FixtureCheck;
use console::style;
use std::fmt::Write as _;
use tablecheck::{SuiteReport, TableReport};

/// Renders summaries to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct Printer {
    verbosity: Verbosity,
}

impl Printer {
    /// Create a printer for the given verbosity
    #[must_use]
    pub const fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    /// Print the per-table and overall summary of a run
    pub fn suite(&self, report: &SuiteReport) {
        println!("{}", render_suite(report, self.verbosity));
    }

    /// Print the fixture load results of `validate`
    pub fn fixtures(&self, checks: &[FixtureCheck]) {
        if self.verbosity.is_quiet() {
            for check in checks.iter().filter(|c| c.records.is_err()) {
                println!("{}", render_fixture(check));
            }
            return;
        }
        for check in checks {
            println!("{}", render_fixture(check));
        }
    }

    /// Print a plain message unless quiet
    pub fn message(&self, message: &str) {
        if !self.verbosity.is_quiet() {
            println!("{message}");
        }
    }
}

fn mark(passed: bool) -> String {
    if passed {
        style("✓").green().to_string()
    } else {
        style("✗").red().to_string()
    }
}

/// One line per table plus an overall line
#[must_use]
pub fn render_suite(report: &SuiteReport, verbosity: Verbosity) -> String {
    let mut out = String::new();
    for table in &report.tables {
        if verbosity.is_quiet() && table.passed() {
            continue;
        }
        let _ = writeln!(out, "{}", render_table(table, verbosity));
    }
    let total = report.tables.len();
    let passed = report.tables_passed();
    let headline = format!(
        "{passed}/{total} tables passed, {} failed checks in {:.1}s",
        report.total_failures(),
        report.duration.as_secs_f64()
    );
    let headline = if report.passed() {
        style(headline).green().bold()
    } else {
        style(headline).red().bold()
    };
    let _ = write!(out, "{headline} (run {})", report.run_id);
    out
}

/// Summary line of one table, with per-phase tallies when verbose
#[must_use]
pub fn render_table(report: &TableReport, verbosity: Verbosity) -> String {
    let mut out = format!(
        "{} {} ({} passed, {} failed)",
        mark(report.passed()),
        style(&report.page).bold(),
        report.passed_count(),
        report.failed_count()
    );
    if verbosity.is_verbose() {
        for phase in report.phase_reports() {
            let _ = write!(
                out,
                "\n    {} {}: {} passed, {} failed, {} skipped",
                mark(phase.succeeded()),
                phase.phase,
                phase.passed,
                phase.failed,
                phase.skipped
            );
        }
    }
    out
}

/// Fixture load result line
#[must_use]
pub fn render_fixture(check: &FixtureCheck) -> String {
    match &check.records {
        Ok(count) => format!(
            "{} {}: {count} records ({})",
            mark(true),
            check.table,
            check.source
        ),
        Err(e) => format!("{} {}: {e}", mark(false), check.table),
    }
}
