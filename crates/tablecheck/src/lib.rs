//! tablecheck: verify browser-rendered data tables against JSON fixtures
//!
//! A rendered table is checked for header presence, row-by-row content
//! equality with its fixture, correct ordering after every sort toggle of
//! every column, and link navigation that neither lands on the wrong page
//! nor loses the selected page size on the way back.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   TABLECHECK Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Fixture    │    │ Table      │    │ PageDriver │            │
//! │   │ (JSON)     │───►│ Verifier   │◄──►│ (chromium  │            │
//! │   │            │    │ + Schema   │    │  or mock)  │            │
//! │   └────────────┘    └─────┬──────┘    └────────────┘            │
//! │                           ▼                                      │
//! │                   LogSink + TableReport                          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use tablecheck::{
//!     verify, ColumnDefinition, ColumnSpec, DeclarativeSchema, EngineSettings, MemorySink,
//!     RunContext, SimulatedTablePage, StaticFixture,
//! };
//!
//! let records = tablecheck::parse_records(r#"[{"id": "A", "state": "done"}]"#, "inline")?;
//! let schema = DeclarativeSchema::new(
//!     "Jobs",
//!     "http://localhost/jobs",
//!     StaticFixture::new("jobs", records),
//!     ColumnSpec::new("id", "ID"),
//!     vec![ColumnDefinition::new("id", "ID"), ColumnDefinition::new("state", "State")],
//! )?;
//! let page = SimulatedTablePage::new(
//!     "http://localhost/jobs",
//!     vec![ColumnSpec::new("id", "ID"), ColumnSpec::new("state", "State")],
//! )
//! .with_row([("id", "A"), ("state", "done")]);
//!
//! let sink = MemorySink::new();
//! let settings = EngineSettings::new().with_settle_delay(0).with_poll_interval(1);
//! let mut ctx = RunContext::new(page).with_sink(sink.clone()).with_settings(settings);
//! let report = verify(&schema, &mut ctx);
//! assert!(report.passed());
//! assert!(sink.contains("Success: Jobs: Content test passed for column: State"));
//! # Ok::<(), tablecheck::TableCheckError>(())
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod browser;
mod context;
mod declarative;
mod driver;
mod engine;
mod fixture;
mod links;
mod locator;
mod mock;
mod reconcile;
mod report;
mod result;
mod schema;
mod sort;
mod suite;
mod value;

/// Bounded polling waits and settle delays
pub mod wait;

#[cfg(feature = "browser")]
pub use browser::ChromiumDriver;
pub use browser::BrowserConfig;
pub use context::{EngineSettings, RunContext, DEFAULT_PAGE_SIZE_OPTIONS};
pub use declarative::{ColumnDefinition, ColumnKind, DeclarativeSchema, CANONICAL_DATE_FORMAT};
pub use driver::PageDriver;
pub use engine::{choose_page_size, verify, TableVerifier};
pub use fixture::{parse_records, FixtureSource, JsonFileFixture, JsonRecord, StaticFixture};
pub use links::distinct_values;
pub use locator::{xpath_literal, Query, Selector, TableContract};
pub use mock::SimulatedTablePage;
pub use reconcile::{reconcile_column, Mismatch, MISSING};
pub use report::{
    Check, CheckStatus, FailureKind, LogLine, LogSink, MemorySink, Phase, PhaseReport,
    Severity, SuiteReport, TableReport, TracingSink, NARRATIVE_TARGET,
};
pub use result::{TableCheckError, TableCheckResult};
pub use schema::{sort_by_column, ColumnSpec, TableSchema};
pub use sort::{SortDirection, SortState, SORT_CYCLES};
pub use suite::{Suite, TableTest};
pub use value::CellValue;
pub use wait::{WaitOptions, Waiter};
