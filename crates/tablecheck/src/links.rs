//! Link-navigation verification.
//!
//! Every distinct value of a link column is clicked once. The destination
//! must mention the value, and returning to the table must leave the
//! page-size control showing what it showed before the click.

use crate::engine::TableVerifier;
use crate::report::{FailureKind, Phase};
use crate::result::TableCheckResult;
use crate::schema::{ColumnSpec, TableSchema};
use std::collections::HashSet;
use tracing::debug;

/// Trimmed, non-empty values in first-seen order without repeats
#[must_use]
pub fn distinct_values(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty() && seen.insert(*v))
        .map(ToString::to_string)
        .collect()
}

impl<S: TableSchema> TableVerifier<'_, S> {
    /// Follow every link of every link column
    pub(crate) fn verify_links(&mut self) {
        let schema = self.schema;
        for column in schema.link_columns() {
            let values = match self.read_column(&column.key) {
                Ok(values) => distinct_values(&values),
                Err(e) => {
                    self.fail(
                        Phase::Links,
                        &column.name,
                        Self::failure_kind(&e),
                        format!("Could not read link column {}: {e}", column.name),
                    );
                    continue;
                }
            };
            debug!(column = %column.key, links = values.len(), "verifying links");
            for (index, value) in values.iter().enumerate() {
                self.follow_link(column, index + 1, value);
            }
        }
    }

    fn follow_link(&mut self, column: &ColumnSpec, ordinal: usize, value: &str) {
        let schema = self.schema;
        let page_url = schema.page_url();
        let row = self.ctx.contract.row_containing(value);
        let baseline = self.page_size_text();

        if let Err(e) = self.waiter.for_present(self.ctx.driver.as_ref(), &row) {
            self.fail(
                Phase::Links,
                value,
                Self::failure_kind(&e),
                format!("Link Test Fail for {ordinal}. {value}: row not found in {}: {e}", column.name),
            );
            return;
        }

        let href = match self
            .ctx
            .driver
            .attribute(&self.ctx.contract.row_link(value), "href")
        {
            Ok(href) => href.unwrap_or_default(),
            Err(e) => {
                debug!(page = schema.page_name(), value, error = %e, "could not read link href");
                String::new()
            }
        };

        match self.ctx.driver.click(&row) {
            Ok(()) => {
                let driver = self.ctx.driver.as_ref();
                let landed = self
                    .waiter
                    .until(&format!("a page mentioning {value}"), || {
                        Ok(driver.page_source()?.contains(value).then_some(()))
                    })
                    .is_ok();
                if landed {
                    self.pass(
                        Phase::Links,
                        value,
                        format!("Link Test Pass for {ordinal}. {value}. URL : {href}"),
                    );
                } else {
                    let current = schema.current_page(self.ctx.driver.as_ref());
                    self.fail(
                        Phase::Links,
                        value,
                        FailureKind::LinkTargetMismatch,
                        format!(
                            "Link Test Fail for {ordinal}. {value} page failed. The current navigation page that we landed on is {current}. Current URL : {href}"
                        ),
                    );
                }
            }
            Err(e) => self.fail(
                Phase::Links,
                value,
                Self::failure_kind(&e),
                format!("Link Test Fail for {ordinal}. {value}: click failed: {e}"),
            ),
        }

        let returned = self
            .ctx
            .driver
            .navigate(page_url)
            .and_then(|()| self.ctx.driver.refresh());
        if let Err(e) = returned {
            self.fail(
                Phase::Links,
                value,
                Self::failure_kind(&e),
                format!("Could not return to {page_url}: {e}"),
            );
            return;
        }

        self.check_page_size_kept(value, baseline);
    }

    fn check_page_size_kept(&mut self, value: &str, baseline: TableCheckResult<String>) {
        let after = self.page_size_text();
        match (baseline, after) {
            (Ok(before), Ok(after)) if before == after => self.pass(
                Phase::Links,
                value,
                format!("Dropdown value unchanged after navigating back: {after}"),
            ),
            (Ok(before), Ok(after)) => self.fail(
                Phase::Links,
                value,
                FailureKind::NavigationRegression,
                format!(
                    "Dropdown value changed after navigating back. Before: {before}, After: {after}"
                ),
            ),
            (Err(e), _) | (_, Err(e)) => self.fail(
                Phase::Links,
                value,
                Self::failure_kind(&e),
                format!("Could not read the page-size control: {e}"),
            ),
        }
    }

    /// Trimmed text the page-size control currently shows
    pub(crate) fn page_size_text(&self) -> TableCheckResult<String> {
        let control = self.ctx.contract.page_size_control();
        self.waiter
            .for_present(self.ctx.driver.as_ref(), &control)
            .map(|text| text.trim().to_string())
    }
}
