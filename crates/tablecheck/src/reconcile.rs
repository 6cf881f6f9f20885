//! Positional content reconciliation.
//!
//! Row *i* of the rendered column is compared with row *i* of the fixture
//! after both sides went through the schema's normalizers. Rows present on
//! one side only are mismatches too.

use crate::engine::TableVerifier;
use crate::report::{FailureKind, Phase};
use crate::schema::{ColumnSpec, TableSchema};
use crate::value::CellValue;
use crate::wait::settle;
use tracing::{debug, warn};

/// Placeholder for a row absent on one side
pub const MISSING: &str = "<missing>";

/// One row whose normalized UI value differs from the fixture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// Zero-based rendered row
    pub row: usize,
    /// Identifier shown in that row
    pub row_id: String,
    /// Normalized UI value
    pub ui: String,
    /// Normalized fixture value
    pub fixture: String,
}

/// Compare one rendered column with the fixture, row by row.
///
/// `row_ids` is the identifier snapshot taken alongside `ui`; it only labels
/// mismatches and is never used to re-join rows.
pub fn reconcile_column<S: TableSchema + ?Sized>(
    schema: &S,
    column: &ColumnSpec,
    ui: &[String],
    fixture: &[S::Record],
    row_ids: &[String],
) -> Vec<Mismatch> {
    let rows = ui.len().max(fixture.len());
    let mut mismatches = Vec::new();

    for row in 0..rows {
        let row_id = row_ids.get(row).map_or(MISSING, |id| id.trim());
        let ui_value = ui.get(row).map(|raw| schema.normalize_ui(column, raw, row_id));
        let fixture_value = fixture.get(row).map(|record| {
            schema.normalize_fixture(column, schema.column_value(record, &column.key), row_id)
        });

        if ui_value != fixture_value {
            mismatches.push(Mismatch {
                row,
                row_id: row_id.to_string(),
                ui: render(ui_value.as_ref()),
                fixture: render(fixture_value.as_ref()),
            });
        }
    }
    mismatches
}

fn render(value: Option<&CellValue>) -> String {
    value.map_or_else(|| MISSING.to_string(), ToString::to_string)
}

impl<S: TableSchema> TableVerifier<'_, S> {
    /// Check the row count, then every declared column, against the fixture.
    ///
    /// Returns true when the row count matched and every column passed.
    pub(crate) fn verify_content(&mut self, records: &[S::Record]) -> bool {
        let schema = self.schema;
        let identifier = &schema.identifier().key;
        debug!(page = schema.page_name(), records = records.len(), "fixture loaded");

        let mut row_ids = match self.read_column(identifier) {
            Ok(ids) => ids,
            Err(e) => {
                self.fail(
                    Phase::Content,
                    &schema.identifier().name,
                    Self::failure_kind(&e),
                    format!("Could not read {}: {e}", schema.identifier().name),
                );
                return false;
            }
        };

        if row_ids.len() != records.len() {
            warn!(
                page = schema.page_name(),
                json = records.len(),
                ui = row_ids.len(),
                "row count differs, re-reading once"
            );
            settle(self.ctx.settings.settle_delay());
            match self.read_column(identifier) {
                Ok(ids) => row_ids = ids,
                Err(e) => {
                    self.fail(
                        Phase::Content,
                        &schema.identifier().name,
                        Self::failure_kind(&e),
                        format!("Could not read {}: {e}", schema.identifier().name),
                    );
                    return false;
                }
            }
        }

        if row_ids.len() != records.len() {
            self.fail(
                Phase::Content,
                "row count",
                FailureKind::RowCountMismatch,
                format!(
                    "Number of items on UI are not equal to the number of items in JSON (JSON: {}, UI: {})",
                    records.len(),
                    row_ids.len()
                ),
            );
            return false;
        }
        self.pass(
            Phase::Content,
            "row count",
            format!(
                "Number of items on UI are equal to the number of items in JSON: {}",
                records.len()
            ),
        );

        let mut all_passed = true;
        for column in schema.columns() {
            match self.compare_column(Phase::Content, column, records, &row_ids) {
                Some(0) => self.pass(
                    Phase::Content,
                    &column.name,
                    format!("Content test passed for column: {}", column.name),
                ),
                _ => all_passed = false,
            }
        }
        all_passed
    }

    /// Read a column and log every mismatching row.
    ///
    /// Returns the number of mismatches, or `None` if the column could not be
    /// read (already recorded as a failure).
    pub(crate) fn compare_column(
        &mut self,
        phase: Phase,
        column: &ColumnSpec,
        records: &[S::Record],
        row_ids: &[String],
    ) -> Option<usize> {
        let ui = match self.read_column(&column.key) {
            Ok(ui) => ui,
            Err(e) => {
                self.fail(
                    phase,
                    &column.name,
                    Self::failure_kind(&e),
                    format!("Could not read column {}: {e}", column.name),
                );
                return None;
            }
        };

        let schema = self.schema;
        let mismatches = reconcile_column(schema, column, &ui, records, row_ids);
        let id_name = &schema.identifier().name;
        for m in &mismatches {
            self.fail(
                phase,
                &column.name,
                FailureKind::ValueMismatch,
                format!(
                    "Incorrect {col} : {ui} in UI for {id_name} : {id}. Correct {col} is: {fixture}",
                    col = column.name,
                    ui = m.ui,
                    id = m.row_id,
                    fixture = m.fixture,
                ),
            );
        }
        Some(mismatches.len())
    }
}
