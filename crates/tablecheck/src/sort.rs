//! Sort-order verification.
//!
//! Each declared column is toggled [`SORT_CYCLES`] times. After every click
//! the engine waits for the header to report a new directional state,
//! re-sorts the in-memory fixture the same way, and reconciles the column
//! positionally against the re-rendered table.

use crate::engine::TableVerifier;
use crate::report::{FailureKind, Phase};
use crate::schema::{ColumnSpec, TableSchema};
use std::cmp::Ordering;
use std::fmt;
use tracing::debug;

/// Header clicks per column
pub const SORT_CYCLES: usize = 3;

/// Direction a column is sorted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    /// Natural order of the column value
    Ascending,
    /// Exact reverse of ascending
    Descending,
}

impl SortDirection {
    /// Orient an ascending comparison to this direction
    #[must_use]
    pub const fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }

    /// The other direction
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => f.write_str("ascending"),
            Self::Descending => f.write_str("descending"),
        }
    }
}

/// Sort state a column header reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortState {
    /// Sorted ascending
    Ascending,
    /// Sorted descending
    Descending,
    /// Not sorted (or unknown attribute value)
    Unsorted,
}

impl SortState {
    /// Parse the header's sort-state attribute
    #[must_use]
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("ascending") => Self::Ascending,
            Some(v) if v.eq_ignore_ascii_case("descending") => Self::Descending,
            _ => Self::Unsorted,
        }
    }

    /// Direction, if the state is directional
    #[must_use]
    pub const fn direction(self) -> Option<SortDirection> {
        match self {
            Self::Ascending => Some(SortDirection::Ascending),
            Self::Descending => Some(SortDirection::Descending),
            Self::Unsorted => None,
        }
    }
}

impl<S: TableSchema> TableVerifier<'_, S> {
    /// Run the sort cycles of every declared column
    pub(crate) fn verify_sorting(&mut self, records: &mut [S::Record]) {
        let schema = self.schema;
        for column in schema.columns() {
            for cycle in 1..=SORT_CYCLES {
                debug!(column = %column.key, cycle, "sort cycle");
                self.sort_cycle(column, records);
            }
        }
    }

    fn sort_cycle(&mut self, column: &ColumnSpec, records: &mut [S::Record]) {
        let header = self.ctx.contract.header(&column.key);
        let attribute = self.ctx.contract.sort_attribute.clone();

        let before = match self.ctx.driver.attribute(&header, &attribute) {
            Ok(value) => value,
            Err(e) => {
                self.fail(
                    Phase::Sorting,
                    &column.name,
                    Self::failure_kind(&e),
                    format!("Could not read sort state of {}: {e}", column.name),
                );
                return;
            }
        };

        if let Err(e) = self.ctx.driver.click(&header) {
            self.fail(
                Phase::Sorting,
                &column.name,
                Self::failure_kind(&e),
                format!("Could not toggle sorting of {}: {e}", column.name),
            );
            return;
        }

        let settled = self.waiter.for_attribute(
            self.ctx.driver.as_ref(),
            &header,
            &attribute,
            |value| {
                SortState::from_attribute(value).direction().is_some()
                    && value != before.as_deref()
            },
        );
        let direction = match settled
            .map(|value| SortState::from_attribute(value.as_deref()).direction())
        {
            Ok(Some(direction)) => direction,
            Ok(None) => {
                self.fail(
                    Phase::Sorting,
                    &column.name,
                    FailureKind::Timeout,
                    format!("Sort state of {} is not directional", column.name),
                );
                return;
            }
            Err(e) => {
                self.fail(
                    Phase::Sorting,
                    &column.name,
                    FailureKind::Timeout,
                    format!("Sort state of {} did not settle: {e}", column.name),
                );
                return;
            }
        };

        self.schema.sort_records(records, &column.key, direction);

        let row_ids = match self.read_column(&self.schema.identifier().key) {
            Ok(ids) => ids,
            Err(e) => {
                self.fail(
                    Phase::Sorting,
                    &column.name,
                    Self::failure_kind(&e),
                    format!("Could not read identifiers after sorting {}: {e}", column.name),
                );
                return;
            }
        };

        match self.compare_column(Phase::Sorting, column, records, &row_ids) {
            Some(0) => self.pass(
                Phase::Sorting,
                &column.name,
                format!(
                    "Values are correctly sorted in {direction} order by: {}",
                    column.name
                ),
            ),
            Some(_) => self.fail(
                Phase::Sorting,
                &column.name,
                FailureKind::SortOrderMismatch,
                format!(
                    "Values are not correctly sorted in {direction} order by: {}",
                    column.name
                ),
            ),
            None => {}
        }
    }
}
