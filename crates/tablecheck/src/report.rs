//! Verification outcomes and the narrative log sink.
//!
//! Every assertion the engine evaluates becomes one [`Check`] and one
//! [`LogLine`]. Lines go to a [`LogSink`] as they happen (for humans);
//! checks are aggregated into a [`TableReport`] (for callers that want to act
//! on the outcome).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Tracing target for narrative lines
pub const NARRATIVE_TARGET: &str = "tablecheck::narrative";

// =============================================================================
// LOG SINK
// =============================================================================

/// Severity of a narrative line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Informational (passing assertion)
    Info,
    /// Failed assertion
    Failure,
}

impl Severity {
    /// Fixed line prefix
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Info => "Success: ",
            Self::Failure => "Failure: ",
        }
    }
}

/// One narrative line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    /// Severity
    pub severity: Severity,
    /// Message without prefix
    pub message: String,
}

impl LogLine {
    /// Create an informational line
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    /// Create a failure line
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Failure,
            message: message.into(),
        }
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.severity.prefix(), self.message)
    }
}

/// Append-only destination for narrative lines
pub trait LogSink {
    /// Record one line
    fn record(&mut self, line: &LogLine);
}

/// Sink forwarding lines to `tracing` (`info` / `error`)
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn record(&mut self, line: &LogLine) {
        match line.severity {
            Severity::Info => tracing::info!(target: NARRATIVE_TARGET, "{line}"),
            Severity::Failure => tracing::error!(target: NARRATIVE_TARGET, "{line}"),
        }
    }
}

/// Sink keeping lines in memory; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<LogLine>>>,
}

impl MemorySink {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded line
    #[must_use]
    pub fn lines(&self) -> Vec<LogLine> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Rendered failure lines
    #[must_use]
    pub fn failures(&self) -> Vec<String> {
        self.lines()
            .iter()
            .filter(|l| l.severity == Severity::Failure)
            .map(ToString::to_string)
            .collect()
    }

    /// True if any rendered line contains `needle`
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.to_string().contains(needle))
    }
}

impl LogSink for MemorySink {
    fn record(&mut self, line: &LogLine) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.clone());
        }
    }
}

// =============================================================================
// CHECKS
// =============================================================================

/// Why an assertion failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// Expected element never appeared
    ElementNotFound,
    /// A bounded wait expired
    Timeout,
    /// UI row count disagrees with the fixture after one retry
    RowCountMismatch,
    /// A normalized UI value disagrees with the fixture
    ValueMismatch,
    /// Reconciliation failed after a sort toggle
    SortOrderMismatch,
    /// The link destination does not mention the clicked value
    LinkTargetMismatch,
    /// Page-size state changed across a navigation round trip
    NavigationRegression,
    /// Fixture missing, unreadable or malformed
    FixtureParseError,
    /// Any other driver failure
    Driver,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ElementNotFound => "element not found",
            Self::Timeout => "timeout",
            Self::RowCountMismatch => "row count mismatch",
            Self::ValueMismatch => "value mismatch",
            Self::SortOrderMismatch => "sort order mismatch",
            Self::LinkTargetMismatch => "link target mismatch",
            Self::NavigationRegression => "navigation regression",
            Self::FixtureParseError => "fixture parse error",
            Self::Driver => "driver error",
        };
        f.write_str(name)
    }
}

/// Verification phase a check belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Opening the table page
    PageLoad,
    /// Header texts present
    Headers,
    /// Fixture load, page size and content reconciliation
    Content,
    /// Per-column sort cycles
    Sorting,
    /// Link navigation round trips
    Links,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PageLoad => "page load",
            Self::Headers => "headers",
            Self::Content => "content",
            Self::Sorting => "sorting",
            Self::Links => "links",
        };
        f.write_str(name)
    }
}

impl Phase {
    /// Every phase, in run order
    pub const ALL: [Self; 5] = [
        Self::PageLoad,
        Self::Headers,
        Self::Content,
        Self::Sorting,
        Self::Links,
    ];
}

/// Outcome of one check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckStatus {
    /// Assertion held
    Passed,
    /// Assertion failed
    Failed(FailureKind),
    /// Assertion was not evaluated
    Skipped,
}

/// One evaluated assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    /// Phase
    pub phase: Phase,
    /// Column, value or control under test
    pub subject: String,
    /// Outcome
    pub status: CheckStatus,
    /// Narrative message, page-prefixed, without severity prefix
    pub message: String,
}

impl Check {
    /// Check passed
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self.status, CheckStatus::Passed)
    }

    /// Failure kind, if the check failed
    #[must_use]
    pub const fn failure(&self) -> Option<FailureKind> {
        match self.status {
            CheckStatus::Failed(kind) => Some(kind),
            _ => None,
        }
    }
}

// =============================================================================
// REPORTS
// =============================================================================

/// Check tally of one phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseReport {
    /// Phase
    pub phase: Phase,
    /// Passed checks
    pub passed: usize,
    /// Failed checks
    pub failed: usize,
    /// Skipped checks
    pub skipped: usize,
}

impl PhaseReport {
    /// True when the phase ran and nothing failed
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.failed == 0 && self.skipped == 0
    }
}

/// Every check evaluated for one table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReport {
    /// Page name
    pub page: String,
    /// Page URL
    pub url: String,
    /// Checks in evaluation order
    pub checks: Vec<Check>,
    /// Wall time spent
    pub duration: Duration,
}

impl TableReport {
    /// True when no check failed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.failure().is_none())
    }

    /// Failed checks
    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| c.failure().is_some())
    }

    /// Checks of one phase
    pub fn phase(&self, phase: Phase) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(move |c| c.phase == phase)
    }

    /// Tally per phase, in run order
    #[must_use]
    pub fn phase_reports(&self) -> Vec<PhaseReport> {
        Phase::ALL
            .iter()
            .map(|&phase| {
                let mut tally = PhaseReport {
                    phase,
                    passed: 0,
                    failed: 0,
                    skipped: 0,
                };
                for check in self.phase(phase) {
                    match check.status {
                        CheckStatus::Passed => tally.passed += 1,
                        CheckStatus::Failed(_) => tally.failed += 1,
                        CheckStatus::Skipped => tally.skipped += 1,
                    }
                }
                tally
            })
            .collect()
    }

    /// Number of failed checks of a given kind
    #[must_use]
    pub fn count_failures(&self, kind: FailureKind) -> usize {
        self.failures().filter(|c| c.failure() == Some(kind)).count()
    }

    /// Number of passed checks
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed()).count()
    }

    /// Number of failed checks
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }
}

/// Reports of every table in a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Unique run identifier
    pub run_id: Uuid,
    /// Per-table reports in run order
    pub tables: Vec<TableReport>,
    /// Wall time spent
    pub duration: Duration,
}

impl SuiteReport {
    /// Create an empty report
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            tables: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    /// True when every table passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.tables.iter().all(TableReport::passed)
    }

    /// Number of tables with no failed check
    #[must_use]
    pub fn tables_passed(&self) -> usize {
        self.tables.iter().filter(|t| t.passed()).count()
    }

    /// Total failed checks across tables
    #[must_use]
    pub fn total_failures(&self) -> usize {
        self.tables.iter().map(TableReport::failed_count).sum()
    }

    /// Serialize to pretty JSON
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for SuiteReport {
    fn default() -> Self {
        Self::new()
    }
}
