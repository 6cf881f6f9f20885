//! Per-table strategy.
//!
//! A [`TableSchema`] tells the engine everything that differs from one table
//! to the next: where the page lives, which fixture backs it, the declared
//! columns, how to read a column out of a record, how to normalize values on
//! both sides before comparison, and how to re-sort the fixture. The engine
//! itself stays the same for every table.

use crate::driver::PageDriver;
use crate::fixture::FixtureSource;
use crate::sort::SortDirection;
use crate::value::CellValue;
use serde::{Deserialize, Serialize};

/// One declared column of a rendered table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Stable key exposed by cells and headers
    pub key: String,
    /// Header text shown to users
    pub name: String,
    /// Cells of this column navigate to a detail page
    #[serde(default)]
    pub link: bool,
}

impl ColumnSpec {
    /// Create a plain column
    #[must_use]
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            link: false,
        }
    }

    /// Mark the column as link-bearing
    #[must_use]
    pub const fn with_link(mut self) -> Self {
        self.link = true;
        self
    }
}

/// Strategy describing one table type.
///
/// Only the page identity, fixture, columns and the column-value extractor
/// are required. The normalizers default to trimmed text on both sides, the
/// sort applier defaults to [`sort_by_column`], and the current-page
/// descriptor defaults to the driver's URL.
pub trait TableSchema {
    /// Fixture record type
    type Record;

    /// Page name used in every log line
    fn page_name(&self) -> &str;

    /// Absolute URL of the page holding the table
    fn page_url(&self) -> &str;

    /// Ground-truth records for the table
    fn fixture(&self) -> &dyn FixtureSource<Record = Self::Record>;

    /// Declared columns, in header order
    fn columns(&self) -> &[ColumnSpec];

    /// Column whose value names a row in failure messages
    fn identifier(&self) -> &ColumnSpec;

    /// Comparable value of `column_key` in `record`
    fn column_value(&self, record: &Self::Record, column_key: &str) -> CellValue;

    /// Columns whose cells are links
    fn link_columns(&self) -> Vec<&ColumnSpec> {
        self.columns().iter().filter(|c| c.link).collect()
    }

    /// Normalize a scraped cell before comparison
    fn normalize_ui(&self, column: &ColumnSpec, raw: &str, row_id: &str) -> CellValue {
        let _ = (column, row_id);
        CellValue::text(raw.trim())
    }

    /// Normalize a fixture value before comparison
    fn normalize_fixture(&self, column: &ColumnSpec, value: CellValue, row_id: &str) -> CellValue {
        let _ = (column, row_id);
        CellValue::text(value.to_string().trim())
    }

    /// Re-sort the fixture in place to the given direction
    fn sort_records(
        &self,
        records: &mut [Self::Record],
        column_key: &str,
        direction: SortDirection,
    ) {
        sort_by_column(self, records, column_key, direction);
    }

    /// Describe where a failed link navigation landed
    fn current_page(&self, driver: &dyn PageDriver) -> String {
        driver
            .current_url()
            .unwrap_or_else(|e| format!("<unknown: {e}>"))
    }
}

/// Stable sort by [`TableSchema::column_value`].
///
/// Ascending is the natural order of the column value; descending is its
/// exact reverse. Ties keep their current relative order in both directions.
pub fn sort_by_column<S: TableSchema + ?Sized>(
    schema: &S,
    records: &mut [S::Record],
    column_key: &str,
    direction: SortDirection,
) {
    records.sort_by(|a, b| {
        let ordering = schema
            .column_value(a, column_key)
            .cmp(&schema.column_value(b, column_key));
        direction.apply(ordering)
    });
}
