//! Table verification engine.
//!
//! [`TableVerifier`] runs the phases of one table in a fixed order:
//!
//! 1. open the page
//! 2. check every declared header text is present
//! 3. load the fixture, select a page size large enough for every record,
//!    reconcile content, and (only if content passed) verify sorting
//! 4. follow every link of every link column
//!
//! No phase aborts another. Driver errors become failed [`Check`]s at the
//! phase boundary, and every narrative line sent to the sink has a matching
//! check in the returned [`TableReport`].

use crate::context::RunContext;
use crate::report::{Check, CheckStatus, FailureKind, LogLine, Phase, TableReport};
use crate::result::{TableCheckError, TableCheckResult};
use crate::schema::TableSchema;
use crate::wait::{settle, Waiter};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Page size to select for `record_count` records.
///
/// The smallest option strictly greater than `record_count`. When no option
/// is large enough, the smallest option is returned; callers should expect
/// the row-count check to fail in that case. `None` only for an empty list.
#[must_use]
pub fn choose_page_size(record_count: usize, options: &[usize]) -> Option<usize> {
    options
        .iter()
        .copied()
        .find(|&size| size > record_count)
        .or_else(|| options.first().copied())
}

/// Verify one table against its fixture
pub fn verify<S: TableSchema>(schema: &S, ctx: &mut RunContext) -> TableReport {
    TableVerifier::new(schema, ctx).run()
}

/// Runs every verification phase of one table
pub struct TableVerifier<'a, S: TableSchema> {
    pub(crate) schema: &'a S,
    pub(crate) ctx: &'a mut RunContext,
    pub(crate) waiter: Waiter,
    checks: Vec<Check>,
}

impl<S: TableSchema> std::fmt::Debug for TableVerifier<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableVerifier")
            .field("page", &self.schema.page_name())
            .field("checks", &self.checks.len())
            .finish_non_exhaustive()
    }
}

impl<'a, S: TableSchema> TableVerifier<'a, S> {
    /// Create a verifier for `schema` running in `ctx`
    pub fn new(schema: &'a S, ctx: &'a mut RunContext) -> Self {
        let waiter = Waiter::new(ctx.settings.wait_options());
        Self {
            schema,
            ctx,
            waiter,
            checks: Vec::new(),
        }
    }

    /// Run every phase and return the collected checks
    pub fn run(mut self) -> TableReport {
        let start = Instant::now();
        let schema = self.schema;
        info!(page = schema.page_name(), url = schema.page_url(), "verifying table");

        self.open_page();
        self.check_headers();
        self.verify_content_and_sorting();
        self.verify_links();

        let report = TableReport {
            page: schema.page_name().to_string(),
            url: schema.page_url().to_string(),
            checks: self.checks,
            duration: start.elapsed(),
        };
        info!(
            page = %report.page,
            passed = report.passed_count(),
            failed = report.failed_count(),
            "table verified"
        );
        report
    }

    // =========================================================================
    // PHASES
    // =========================================================================

    fn open_page(&mut self) {
        let schema = self.schema;
        let url = schema.page_url();
        match self.ctx.driver.navigate(url) {
            Ok(()) => {
                settle(self.ctx.settings.settle_delay());
                self.pass(Phase::PageLoad, url, format!("Opened web page: {url}"));
            }
            Err(e) => self.fail(
                Phase::PageLoad,
                url,
                Self::failure_kind(&e),
                format!("Error in opening web page: {url}: {e}"),
            ),
        }
    }

    fn check_headers(&mut self) {
        let schema = self.schema;
        for column in schema.columns() {
            let selector = self.ctx.contract.header_text(&column.name);
            match self.waiter.for_present(self.ctx.driver.as_ref(), &selector) {
                Ok(_) => self.pass(
                    Phase::Headers,
                    &column.name,
                    format!("Text present: {}", column.name),
                ),
                Err(e) if e.is_not_found() => self.fail(
                    Phase::Headers,
                    &column.name,
                    FailureKind::ElementNotFound,
                    format!("Text not present: {}", column.name),
                ),
                Err(e) => self.fail(
                    Phase::Headers,
                    &column.name,
                    Self::failure_kind(&e),
                    format!("Text not present: {}: {e}", column.name),
                ),
            }
        }
    }

    fn verify_content_and_sorting(&mut self) {
        let schema = self.schema;
        let fixture = schema.fixture();
        let mut records = match fixture.load() {
            Ok(records) => records,
            Err(e) => {
                let detail = match &e {
                    TableCheckError::FixtureError { message, .. } => message.clone(),
                    other => other.to_string(),
                };
                self.fail(
                    Phase::Content,
                    &fixture.describe(),
                    FailureKind::FixtureParseError,
                    format!("Error in JSON Parsing: {}: {detail}", fixture.describe()),
                );
                self.skip(Phase::Sorting, schema.page_name(), "fixture unavailable");
                return;
            }
        };

        self.select_page_size(records.len());

        if self.verify_content(&records) {
            self.verify_sorting(&mut records);
        } else {
            self.skip(
                Phase::Sorting,
                schema.page_name(),
                "content reconciliation failed",
            );
        }
    }

    /// Make every record fit on one page.
    ///
    /// Failures are recorded but content reconciliation still runs; a page
    /// size that did not take effect shows up as a row-count mismatch.
    fn select_page_size(&mut self, record_count: usize) {
        let Some(size) = choose_page_size(record_count, &self.ctx.settings.page_size_options)
        else {
            self.fail(
                Phase::Content,
                "page size",
                FailureKind::Driver,
                "No page-size options configured".to_string(),
            );
            return;
        };
        if size <= record_count {
            warn!(
                page = self.schema.page_name(),
                records = record_count,
                size,
                "no page-size option exceeds the record count, using the smallest"
            );
        }
        debug!(page = self.schema.page_name(), size, "selecting page size");

        if let Err(e) = self.apply_page_size(size) {
            self.fail(
                Phase::Content,
                "page size",
                Self::failure_kind(&e),
                format!("Could not select page size {size}: {e}"),
            );
        }
    }

    fn apply_page_size(&mut self, size: usize) -> TableCheckResult<()> {
        let contract = self.ctx.contract.clone();
        self.ctx.driver.click(&contract.page_size_control())?;
        self.waiter
            .for_all_visible(self.ctx.driver.as_ref(), &contract.page_size_options())?;
        self.ctx.driver.click(&contract.page_size_option(size))?;
        self.waiter
            .for_absent(self.ctx.driver.as_ref(), &contract.page_size_options())?;
        self.ctx.driver.refresh()?;
        settle(self.ctx.settings.settle_delay());
        Ok(())
    }

    // =========================================================================
    // RECORDING
    // =========================================================================

    /// Rendered cell texts of one column
    pub(crate) fn read_column(&self, column_key: &str) -> TableCheckResult<Vec<String>> {
        self.ctx
            .driver
            .texts(&self.ctx.contract.cells(column_key))
    }

    pub(crate) fn pass(&mut self, phase: Phase, subject: &str, message: String) {
        self.record(phase, subject, CheckStatus::Passed, message);
    }

    pub(crate) fn fail(&mut self, phase: Phase, subject: &str, kind: FailureKind, message: String) {
        self.record(phase, subject, CheckStatus::Failed(kind), message);
    }

    pub(crate) fn skip(&mut self, phase: Phase, subject: &str, reason: &str) {
        debug!(page = self.schema.page_name(), %phase, reason, "phase skipped");
        self.checks.push(Check {
            phase,
            subject: subject.to_string(),
            status: CheckStatus::Skipped,
            message: format!("{}: {phase} skipped: {reason}", self.schema.page_name()),
        });
    }

    fn record(&mut self, phase: Phase, subject: &str, status: CheckStatus, message: String) {
        let message = format!("{}: {message}", self.schema.page_name());
        let line = match status {
            CheckStatus::Failed(_) => LogLine::failure(&message),
            _ => LogLine::info(&message),
        };
        self.ctx.sink.record(&line);
        self.checks.push(Check {
            phase,
            subject: subject.to_string(),
            status,
            message,
        });
    }

    pub(crate) const fn failure_kind(error: &TableCheckError) -> FailureKind {
        match error {
            TableCheckError::ElementNotFound { .. } => FailureKind::ElementNotFound,
            TableCheckError::Timeout { .. } => FailureKind::Timeout,
            TableCheckError::FixtureError { .. } => FailureKind::FixtureParseError,
            _ => FailureKind::Driver,
        }
    }
}
