//! Table schemas built from configuration.
//!
//! [`DeclarativeSchema`] covers tables whose fixture is a JSON array of
//! objects and whose columns only need one of a few standard normalizations:
//!
//! | kind | UI and fixture values compared as |
//! |------|-----------------------------------|
//! | `text` | trimmed text |
//! | `integer` | integer, thousands separators ignored |
//! | `decimal` | number rounded to `places` |
//! | `date` | `%Y-%m-%d %H:%M:%S` after parsing each side with its own format |
//!
//! Values that do not parse fall back to trimmed text, so they still compare
//! (and mismatch) visibly instead of being dropped.

use crate::fixture::{FixtureSource, JsonRecord};
use crate::result::{TableCheckError, TableCheckResult};
use crate::schema::{ColumnSpec, TableSchema};
use crate::sort::SortDirection;
use crate::value::CellValue;
use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

/// Format dates are compared in
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// How a column's values are normalized
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Trimmed text
    #[default]
    Text,
    /// Whole number
    Integer,
    /// Number rounded to a fixed number of decimal places
    Decimal {
        /// Decimal places kept
        places: u32,
    },
    /// Date or timestamp
    Date {
        /// `strftime` format of the rendered value
        ui_format: String,
        /// `strftime` format of the fixture value
        fixture_format: String,
    },
}

/// One configured column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Key exposed by cells and headers
    pub key: String,
    /// Header text
    pub name: String,
    /// Fixture field holding the value (defaults to `key`)
    #[serde(default)]
    pub field: Option<String>,
    /// Normalization
    #[serde(default)]
    pub kind: ColumnKind,
    /// Cells navigate to a detail page
    #[serde(default)]
    pub link: bool,
}

impl ColumnDefinition {
    /// Create a text column
    #[must_use]
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            field: None,
            kind: ColumnKind::Text,
            link: false,
        }
    }

    /// Set the normalization
    #[must_use]
    pub fn with_kind(mut self, kind: ColumnKind) -> Self {
        self.kind = kind;
        self
    }

    /// Read the value from a differently named fixture field
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Mark the column as link-bearing
    #[must_use]
    pub const fn with_link(mut self) -> Self {
        self.link = true;
        self
    }

    fn field(&self) -> &str {
        self.field.as_deref().unwrap_or(&self.key)
    }

    fn spec(&self) -> ColumnSpec {
        ColumnSpec {
            key: self.key.clone(),
            name: self.name.clone(),
            link: self.link,
        }
    }
}

/// [`TableSchema`] over JSON-object records
pub struct DeclarativeSchema {
    name: String,
    url: String,
    fixture: Box<dyn FixtureSource<Record = JsonRecord>>,
    definitions: Vec<ColumnDefinition>,
    columns: Vec<ColumnSpec>,
    identifier: ColumnSpec,
}

impl fmt::Debug for DeclarativeSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeclarativeSchema")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("fixture", &self.fixture.describe())
            .field("definitions", &self.definitions)
            .field("identifier", &self.identifier)
            .finish()
    }
}

impl DeclarativeSchema {
    /// Build a schema, rejecting unusable column definitions
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        fixture: impl FixtureSource<Record = JsonRecord> + 'static,
        identifier: ColumnSpec,
        definitions: Vec<ColumnDefinition>,
    ) -> TableCheckResult<Self> {
        let name = name.into();
        if definitions.is_empty() {
            return Err(TableCheckError::invalid_config(format!(
                "table {name} declares no columns"
            )));
        }
        let mut seen = HashSet::new();
        for definition in &definitions {
            if !seen.insert(definition.key.as_str()) {
                return Err(TableCheckError::invalid_config(format!(
                    "table {name} declares column {} twice",
                    definition.key
                )));
            }
            if let ColumnKind::Date {
                ui_format,
                fixture_format,
            } = &definition.kind
            {
                for format in [ui_format, fixture_format] {
                    if !is_valid_format(format) {
                        return Err(TableCheckError::invalid_config(format!(
                            "column {} has an invalid date format: {format}",
                            definition.key
                        )));
                    }
                }
            }
        }

        let columns = definitions.iter().map(ColumnDefinition::spec).collect();
        Ok(Self {
            name,
            url: url.into(),
            fixture: Box::new(fixture),
            definitions,
            columns,
            identifier,
        })
    }

    /// Configured column definitions
    #[must_use]
    pub fn definitions(&self) -> &[ColumnDefinition] {
        &self.definitions
    }

    fn definition(&self, key: &str) -> Option<&ColumnDefinition> {
        self.definitions.iter().find(|d| d.key == key)
    }

    fn kind(&self, key: &str) -> &ColumnKind {
        self.definition(key).map_or(&ColumnKind::Text, |d| &d.kind)
    }

    fn sort_key(&self, record: &JsonRecord, key: &str) -> CellValue {
        let value = self.column_value(record, key);
        match self.kind(key) {
            ColumnKind::Text => value,
            ColumnKind::Decimal { .. } => {
                numeric(&value).map_or(value, CellValue::Float)
            }
            kind => normalize_fixture(kind, value),
        }
    }
}

impl TableSchema for DeclarativeSchema {
    type Record = JsonRecord;

    fn page_name(&self) -> &str {
        &self.name
    }

    fn page_url(&self) -> &str {
        &self.url
    }

    fn fixture(&self) -> &dyn FixtureSource<Record = JsonRecord> {
        self.fixture.as_ref()
    }

    fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    fn identifier(&self) -> &ColumnSpec {
        &self.identifier
    }

    fn column_value(&self, record: &JsonRecord, column_key: &str) -> CellValue {
        let field = self.definition(column_key).map_or(column_key, ColumnDefinition::field);
        record.get(field).map_or(CellValue::Null, CellValue::from)
    }

    fn normalize_ui(&self, column: &ColumnSpec, raw: &str, _row_id: &str) -> CellValue {
        normalize_ui(self.kind(&column.key), raw)
    }

    fn normalize_fixture(&self, column: &ColumnSpec, value: CellValue, _row_id: &str) -> CellValue {
        normalize_fixture(self.kind(&column.key), value)
    }

    fn sort_records(&self, records: &mut [JsonRecord], column_key: &str, direction: SortDirection) {
        records.sort_by(|a, b| {
            direction.apply(
                self.sort_key(a, column_key)
                    .cmp(&self.sort_key(b, column_key)),
            )
        });
    }
}

// =============================================================================
// NORMALIZATION
// =============================================================================

fn number_pattern() -> Option<&'static Regex> {
    static NUMBER: OnceLock<Option<Regex>> = OnceLock::new();
    NUMBER
        .get_or_init(|| Regex::new(r"-?\d[\d,]*(?:\.\d+)?").ok())
        .as_ref()
}

fn extract_number(text: &str) -> Option<String> {
    number_pattern()?
        .find(text)
        .map(|m| m.as_str().replace(',', ""))
}

fn parse_integer(text: &str) -> Option<i64> {
    let digits = extract_number(text)?;
    digits.parse::<i64>().ok().or_else(|| {
        digits
            .parse::<f64>()
            .ok()
            .filter(|f| f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

fn parse_decimal(text: &str) -> Option<f64> {
    extract_number(text)?.parse().ok()
}

fn round(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places.min(15) as i32);
    (value * factor).round() / factor
}

fn parse_date(text: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, format).ok().or_else(|| {
        NaiveDate::parse_from_str(text, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
}

fn canonical_date(text: &str, format: &str) -> CellValue {
    parse_date(text, format).map_or_else(
        || CellValue::text(text),
        |dt| CellValue::text(dt.format(CANONICAL_DATE_FORMAT).to_string()),
    )
}

fn is_valid_format(format: &str) -> bool {
    !format.is_empty() && StrftimeItems::new(format).all(|item| !matches!(item, Item::Error))
}

fn numeric(value: &CellValue) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(parse_decimal))
}

fn normalize_ui(kind: &ColumnKind, raw: &str) -> CellValue {
    let text = raw.trim();
    match kind {
        ColumnKind::Text => CellValue::text(text),
        ColumnKind::Integer => parse_integer(text).map_or_else(|| CellValue::text(text), CellValue::Int),
        ColumnKind::Decimal { places } => parse_decimal(text).map_or_else(
            || CellValue::text(text),
            |x| CellValue::Float(round(x, *places)),
        ),
        ColumnKind::Date { ui_format, .. } => canonical_date(text, ui_format),
    }
}

fn normalize_fixture(kind: &ColumnKind, value: CellValue) -> CellValue {
    let text = value.to_string();
    let text = text.trim();
    match kind {
        ColumnKind::Text => CellValue::text(text),
        ColumnKind::Integer => match value {
            CellValue::Int(i) => CellValue::Int(i),
            CellValue::Float(f) if f.fract() == 0.0 => CellValue::Int(f as i64),
            _ => parse_integer(text).map_or_else(|| CellValue::text(text), CellValue::Int),
        },
        ColumnKind::Decimal { places } => numeric(&value).map_or_else(
            || CellValue::text(text),
            |x| CellValue::Float(round(x, *places)),
        ),
        ColumnKind::Date { fixture_format, .. } => canonical_date(text, fixture_format),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::fixture::{parse_records, StaticFixture};
    use proptest::prelude::*;

    fn records() -> Vec<JsonRecord> {
        parse_records(
            r#"[
                {"Wuid": "W3", "Owner": "carol", "Files": 1200, "Cost": 0.125, "Created": "2024/03/01 10:00"},
                {"Wuid": "W1", "Owner": "alice", "Files": 35, "Cost": 12.5, "Created": "2023/12/24 08:30"},
                {"Wuid": "W2", "Owner": "bob", "Files": 900, "Cost": null, "Created": "2024/01/15 23:59"}
            ]"#,
            "inline",
        )
        .unwrap()
    }

    fn schema() -> DeclarativeSchema {
        DeclarativeSchema::new(
            "Workunits",
            "http://localhost/workunits",
            StaticFixture::new("workunits", records()),
            ColumnSpec::new("Wuid", "WUID"),
            vec![
                ColumnDefinition::new("Wuid", "WUID").with_link(),
                ColumnDefinition::new("owner", "Owner").with_field("Owner"),
                ColumnDefinition::new("Files", "Files").with_kind(ColumnKind::Integer),
                ColumnDefinition::new("Cost", "Cost").with_kind(ColumnKind::Decimal { places: 2 }),
                ColumnDefinition::new("Created", "Created").with_kind(ColumnKind::Date {
                    ui_format: "%d-%m-%Y %H:%M".to_string(),
                    fixture_format: "%Y/%m/%d %H:%M".to_string(),
                }),
            ],
        )
        .unwrap()
    }

    fn column<'a>(schema: &'a DeclarativeSchema, key: &str) -> &'a ColumnSpec {
        schema.columns().iter().find(|c| c.key == key).unwrap()
    }

    fn keys(schema: &DeclarativeSchema, records: &[JsonRecord], key: &str) -> Vec<String> {
        records
            .iter()
            .map(|r| schema.column_value(r, key).to_string())
            .collect()
    }

    mod construction_tests {
        use super::*;

        #[test]
        fn test_columns_and_links() {
            let schema = schema();
            assert_eq!(schema.columns().len(), 5);
            assert_eq!(schema.link_columns().len(), 1);
            assert_eq!(schema.identifier().key, "Wuid");
            assert_eq!(schema.definitions()[1].field.as_deref(), Some("Owner"));
        }

        #[test]
        fn test_rejects_empty_columns() {
            let err = DeclarativeSchema::new(
                "Empty",
                "http://localhost",
                StaticFixture::new("none", Vec::new()),
                ColumnSpec::new("id", "ID"),
                Vec::new(),
            )
            .unwrap_err();
            assert!(err.to_string().contains("no columns"));
        }

        #[test]
        fn test_rejects_duplicate_keys() {
            let result = DeclarativeSchema::new(
                "Dup",
                "http://localhost",
                StaticFixture::new("none", Vec::new()),
                ColumnSpec::new("id", "ID"),
                vec![ColumnDefinition::new("id", "ID"), ColumnDefinition::new("id", "Id")],
            );
            assert!(result.is_err());
        }

        #[test]
        fn test_rejects_bad_date_format() {
            let result = DeclarativeSchema::new(
                "Dates",
                "http://localhost",
                StaticFixture::new("none", Vec::new()),
                ColumnSpec::new("id", "ID"),
                vec![ColumnDefinition::new("d", "D").with_kind(ColumnKind::Date {
                    ui_format: "%Y-%".to_string(),
                    fixture_format: "%Y".to_string(),
                })],
            );
            assert!(result.is_err());
        }

        #[test]
        fn test_kind_deserializes_from_yaml_like_json() {
            let text: ColumnDefinition =
                serde_json::from_str(r#"{"key": "a", "name": "A"}"#).unwrap();
            assert_eq!(text.kind, ColumnKind::Text);
            let integer: ColumnDefinition =
                serde_json::from_str(r#"{"key": "a", "name": "A", "kind": "integer"}"#).unwrap();
            assert_eq!(integer.kind, ColumnKind::Integer);
            let decimal: ColumnDefinition = serde_json::from_str(
                r#"{"key": "a", "name": "A", "kind": {"decimal": {"places": 3}}}"#,
            )
            .unwrap();
            assert_eq!(decimal.kind, ColumnKind::Decimal { places: 3 });
        }
    }

    mod normalization_tests {
        use super::*;

        #[test]
        fn test_field_mapping() {
            let schema = schema();
            let records = records();
            assert_eq!(
                schema.column_value(&records[0], "owner"),
                CellValue::text("carol")
            );
            assert!(schema.column_value(&records[0], "absent").is_null());
        }

        #[test]
        fn test_integer_ignores_separators() {
            let schema = schema();
            let files = column(&schema, "Files");
            assert_eq!(schema.normalize_ui(files, " 1,200 ", "W3"), CellValue::Int(1200));
            assert_eq!(
                schema.normalize_fixture(files, CellValue::Int(1200), "W3"),
                CellValue::Int(1200)
            );
            assert_eq!(
                schema.normalize_ui(files, "n/a", "W3"),
                CellValue::text("n/a")
            );
        }

        #[test]
        fn test_decimal_rounds_both_sides() {
            let schema = schema();
            let cost = column(&schema, "Cost");
            assert_eq!(
                schema.normalize_ui(cost, "$0.13", "W3"),
                schema.normalize_fixture(cost, CellValue::Float(0.125), "W3")
            );
            assert_eq!(
                schema.normalize_ui(cost, "12.50", "W1"),
                CellValue::Float(12.5)
            );
            assert_eq!(
                schema.normalize_fixture(cost, CellValue::Null, "W2"),
                CellValue::text("")
            );
        }

        #[test]
        fn test_date_formats_compare_canonically() {
            let schema = schema();
            let created = column(&schema, "Created");
            let ui = schema.normalize_ui(created, "01-03-2024 10:00", "W3");
            let fixture =
                schema.normalize_fixture(created, CellValue::text("2024/03/01 10:00"), "W3");
            assert_eq!(ui, fixture);
            assert_eq!(ui, CellValue::text("2024-03-01 10:00:00"));
        }

        #[test]
        fn test_date_only_format() {
            assert_eq!(
                canonical_date("2024-02-29", "%Y-%m-%d"),
                CellValue::text("2024-02-29 00:00:00")
            );
            assert_eq!(canonical_date("not a date", "%Y-%m-%d"), CellValue::text("not a date"));
        }

        #[test]
        fn test_text_trims() {
            let schema = schema();
            let owner = column(&schema, "owner");
            assert_eq!(schema.normalize_ui(owner, " bob\n", "W2"), CellValue::text("bob"));
        }
    }

    mod sort_tests {
        use super::*;

        #[test]
        fn test_integer_sorts_numerically() {
            let schema = schema();
            let mut records = records();
            schema.sort_records(&mut records, "Files", SortDirection::Ascending);
            assert_eq!(keys(&schema, &records, "Wuid"), vec!["W1", "W2", "W3"]);
        }

        #[test]
        fn test_date_sorts_chronologically() {
            let schema = schema();
            let mut records = records();
            schema.sort_records(&mut records, "Created", SortDirection::Descending);
            assert_eq!(keys(&schema, &records, "Wuid"), vec!["W3", "W2", "W1"]);
        }

        #[test]
        fn test_null_decimal_sorts_first() {
            let schema = schema();
            let mut records = records();
            schema.sort_records(&mut records, "Cost", SortDirection::Ascending);
            assert_eq!(keys(&schema, &records, "Wuid"), vec!["W2", "W3", "W1"]);
        }
    }

    proptest! {
        #[test]
        fn prop_integer_roundtrips_through_grouping(n in -1_000_000_000i64..1_000_000_000) {
            let mut grouped = String::new();
            let digits = n.unsigned_abs().to_string();
            for (i, c) in digits.chars().enumerate() {
                if i > 0 && (digits.len() - i) % 3 == 0 {
                    grouped.push(',');
                }
                grouped.push(c);
            }
            if n < 0 {
                grouped.insert(0, '-');
            }
            prop_assert_eq!(parse_integer(&grouped), Some(n));
        }
    }
}
