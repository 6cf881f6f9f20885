//! Running several tables in one browser session.

use crate::context::RunContext;
use crate::engine::verify;
use crate::report::{SuiteReport, TableReport};
use crate::schema::TableSchema;
use std::fmt;
use std::time::Instant;
use tracing::{info, warn};

/// A table that can be verified within a run
pub trait TableTest {
    /// Name used in summaries
    fn name(&self) -> &str;

    /// Verify the table
    fn run(&self, ctx: &mut RunContext) -> TableReport;
}

impl<S: TableSchema> TableTest for S {
    fn name(&self) -> &str {
        self.page_name()
    }

    fn run(&self, ctx: &mut RunContext) -> TableReport {
        verify(self, ctx)
    }
}

/// Ordered collection of table tests
#[derive(Default)]
pub struct Suite {
    tests: Vec<Box<dyn TableTest>>,
}

impl fmt::Debug for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("tests", &self.names())
            .finish()
    }
}

impl Suite {
    /// Create an empty suite
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a table test
    #[must_use]
    pub fn with_test(mut self, test: impl TableTest + 'static) -> Self {
        self.add(test);
        self
    }

    /// Append a table test
    pub fn add(&mut self, test: impl TableTest + 'static) {
        self.tests.push(Box::new(test));
    }

    /// Names of the tests, in run order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tests.iter().map(|t| t.name()).collect()
    }

    /// Number of tests
    #[must_use]
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// True when the suite holds no tests
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Run every test in order, then close the session.
    ///
    /// A failing table never stops the run. Closing errors are logged, not
    /// returned.
    pub fn run(&self, ctx: &mut RunContext) -> SuiteReport {
        let start = Instant::now();
        let mut report = SuiteReport::new();
        info!(run_id = %report.run_id, tables = self.tests.len(), "suite started");

        for test in &self.tests {
            report.tables.push(test.run(ctx));
        }

        if let Err(e) = ctx.close() {
            warn!(error = %e, "failed to close browser session");
        }
        report.duration = start.elapsed();
        info!(
            run_id = %report.run_id,
            passed = report.tables_passed(),
            failed = report.tables.len() - report.tables_passed(),
            "suite finished"
        );
        report
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::context::EngineSettings;
    use crate::mock::SimulatedTablePage;
    use crate::report::{Check, CheckStatus, Phase};
    use std::time::Duration;

    struct Canned(&'static str, bool);

    impl TableTest for Canned {
        fn name(&self) -> &str {
            self.0
        }

        fn run(&self, _ctx: &mut RunContext) -> TableReport {
            let status = if self.1 {
                CheckStatus::Passed
            } else {
                CheckStatus::Failed(crate::report::FailureKind::ValueMismatch)
            };
            TableReport {
                page: self.0.to_string(),
                url: String::new(),
                checks: vec![Check {
                    phase: Phase::Content,
                    subject: "x".to_string(),
                    status,
                    message: String::new(),
                }],
                duration: Duration::ZERO,
            }
        }
    }

    #[test]
    fn test_runs_all_tables_and_closes() {
        let page = SimulatedTablePage::new("http://localhost/a", Vec::new());
        let mut ctx = RunContext::new(page.clone()).with_settings(EngineSettings::new());
        let suite = Suite::new()
            .with_test(Canned("first", false))
            .with_test(Canned("second", true));

        assert_eq!(suite.names(), vec!["first", "second"]);
        let report = suite.run(&mut ctx);
        assert_eq!(report.tables.len(), 2);
        assert_eq!(report.tables_passed(), 1);
        assert!(!report.passed());
        assert!(page.is_closed());
    }

    #[test]
    fn test_empty_suite_still_closes() {
        let page = SimulatedTablePage::new("http://localhost/a", Vec::new());
        let mut ctx = RunContext::new(page.clone());
        let suite = Suite::new();
        assert!(suite.is_empty());
        let report = suite.run(&mut ctx);
        assert!(report.passed());
        assert!(page.is_closed());
    }
}
