//! End-to-end verification of simulated table pages.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use serde::Deserialize;
use std::io::Write;
use tablecheck::{
    verify, CellValue, CheckStatus, ColumnDefinition, ColumnKind, ColumnSpec, DeclarativeSchema,
    EngineSettings, FailureKind, FixtureSource, JsonFileFixture, MemorySink, Phase, RunContext,
    SimulatedTablePage, StaticFixture, Suite, TableReport, TableSchema,
};

const URL: &str = "http://localhost/jobs";

#[derive(Debug, Clone, Deserialize)]
struct Job {
    id: String,
    status: String,
    size: i64,
}

struct Jobs {
    fixture: Box<dyn FixtureSource<Record = Job>>,
    columns: Vec<ColumnSpec>,
}

impl Jobs {
    fn new(fixture: impl FixtureSource<Record = Job> + 'static) -> Self {
        Self {
            fixture: Box::new(fixture),
            columns: vec![
                ColumnSpec::new("id", "ID").with_link(),
                ColumnSpec::new("status", "Status"),
                ColumnSpec::new("size", "Size"),
            ],
        }
    }

    fn with_records(records: Vec<Job>) -> Self {
        Self::new(StaticFixture::new("jobs.json", records))
    }
}

impl TableSchema for Jobs {
    type Record = Job;

    fn page_name(&self) -> &str {
        "Jobs"
    }

    fn page_url(&self) -> &str {
        URL
    }

    fn fixture(&self) -> &dyn FixtureSource<Record = Job> {
        self.fixture.as_ref()
    }

    fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    fn identifier(&self) -> &ColumnSpec {
        &self.columns[0]
    }

    fn column_value(&self, record: &Job, column_key: &str) -> CellValue {
        match column_key {
            "id" => CellValue::text(&record.id),
            "status" => CellValue::text(&record.status),
            "size" => CellValue::Int(record.size),
            _ => CellValue::Null,
        }
    }
}

fn job(id: &str, status: &str, size: i64) -> Job {
    Job {
        id: id.to_string(),
        status: status.to_string(),
        size,
    }
}

fn abc() -> Vec<Job> {
    vec![job("A", "z", 30), job("B", "x", 4), job("C", "y", 100)]
}

fn page_for(records: &[Job]) -> SimulatedTablePage {
    SimulatedTablePage::new(
        URL,
        vec![
            ColumnSpec::new("id", "ID").with_link(),
            ColumnSpec::new("status", "Status"),
            ColumnSpec::new("size", "Size"),
        ],
    )
    .with_rows(records.iter().map(|r| {
        vec![
            ("id", r.id.clone()),
            ("status", r.status.clone()),
            ("size", r.size.to_string()),
        ]
    }))
}

fn settings() -> EngineSettings {
    EngineSettings::new()
        .with_settle_delay(0)
        .with_wait_timeout(100)
        .with_poll_interval(1)
}

fn run<S: TableSchema>(schema: &S, page: SimulatedTablePage) -> (TableReport, MemorySink) {
    let sink = MemorySink::new();
    let mut ctx = RunContext::new(page)
        .with_sink(sink.clone())
        .with_settings(settings());
    let report = verify(schema, &mut ctx);
    (report, sink)
}

#[test]
fn test_matching_table_passes_every_phase() {
    let schema = Jobs::with_records(abc());
    let page = page_for(&abc());
    let (report, sink) = run(&schema, page.clone());

    assert!(report.passed(), "unexpected failures: {:?}", sink.failures());
    assert!(sink.contains("Success: Jobs: Text present: Status"));
    assert!(sink.contains("Success: Jobs: Content test passed for column: Size"));
    assert!(sink.contains("Success: Jobs: Values are correctly sorted in ascending order by: Size"));
    assert!(sink.contains("Success: Jobs: Values are correctly sorted in descending order by: ID"));
    // links are numbered in rendered order, which the last Size sort left as B, A, C
    assert!(sink.contains("Success: Jobs: Link Test Pass for 1. B. URL : http://localhost/jobs#/details/B"));
    assert!(sink.contains("Success: Jobs: Link Test Pass for 2. A. URL : http://localhost/jobs#/details/A"));
    assert!(sink.contains("Success: Jobs: Link Test Pass for 3. C."));

    // 3 columns x 3 cycles
    let sort_passes = report
        .phase(Phase::Sorting)
        .filter(|c| c.passed())
        .count();
    assert_eq!(sort_passes, 9);
    assert_eq!(page.page_size(), 10);
}

#[test]
fn test_unsorted_column_reports_expected_direction() {
    let schema = Jobs::with_records(abc());
    let page = page_for(&abc()).with_unsorted_column("status");
    let (report, sink) = run(&schema, page);

    assert!(sink.contains("Failure: Jobs: Values are not correctly sorted in ascending order by: Status"));
    assert!(sink.contains("Failure: Jobs: Values are not correctly sorted in descending order by: Status"));
    assert!(sink.contains("Failure: Jobs: Incorrect Status : z in UI for ID : A. Correct Status is: x"));
    assert_eq!(report.count_failures(FailureKind::SortOrderMismatch), 3);
    assert!(report.phase(Phase::Content).all(|c| c.passed()));
}

#[test]
fn test_row_count_mismatch_skips_sorting() {
    let records = vec![
        job("A", "a", 1),
        job("B", "b", 2),
        job("C", "c", 3),
        job("D", "d", 4),
        job("E", "e", 5),
    ];
    let schema = Jobs::with_records(records.clone());
    let page = page_for(&records).with_hidden_rows(1);
    let (report, sink) = run(&schema, page);

    assert!(sink.contains(
        "Failure: Jobs: Number of items on UI are not equal to the number of items in JSON (JSON: 5, UI: 4)"
    ));
    assert_eq!(report.count_failures(FailureKind::RowCountMismatch), 1);
    let sorting: Vec<_> = report.phase(Phase::Sorting).collect();
    assert_eq!(sorting.len(), 1);
    assert_eq!(sorting[0].status, CheckStatus::Skipped);
    assert!(!sink.contains("sorted in"));
    assert!(report.phase(Phase::Links).count() > 0);
}

#[test]
fn test_row_count_retry_absorbs_slow_render() {
    let schema = Jobs::with_records(abc());
    let page = page_for(&abc()).with_lagging_reads(1);
    let (report, sink) = run(&schema, page);

    assert_eq!(report.count_failures(FailureKind::RowCountMismatch), 0);
    assert!(report.passed(), "unexpected failures: {:?}", sink.failures());
}

#[test]
fn test_value_mismatch_names_row_and_both_values() {
    let schema = Jobs::with_records(abc());
    let page = page_for(&abc()).with_cell_override("B", "size", "5");
    let (report, sink) = run(&schema, page);

    assert!(sink.contains("Failure: Jobs: Incorrect Size : 5 in UI for ID : B. Correct Size is: 4"));
    assert!(!sink.contains("Content test passed for column: Size"));
    assert!(sink.contains("Content test passed for column: Status"));
    assert!(report.count_failures(FailureKind::ValueMismatch) >= 1);
    let sorting: Vec<_> = report.phase(Phase::Sorting).collect();
    assert_eq!(sorting[0].status, CheckStatus::Skipped);
}

#[test]
fn test_broken_link_reports_landing_page() {
    let schema = Jobs::with_records(abc());
    let page = page_for(&abc()).with_broken_link("B");
    let (report, sink) = run(&schema, page);

    assert!(sink.contains(
        "Failure: Jobs: Link Test Fail for 1. B page failed. The current navigation page that we landed on is http://localhost/jobs#/details/B. Current URL : http://localhost/jobs#/details/B"
    ));
    assert_eq!(report.count_failures(FailureKind::LinkTargetMismatch), 1);
    assert!(sink.contains("Link Test Pass for 3. C."));
}

#[test]
fn test_page_size_regression_after_navigation() {
    let schema = Jobs::with_records(abc());
    let page = page_for(&abc())
        .with_page_size_options(vec![2, 5])
        .with_page_size_reset_on_return();
    let settings = settings().with_page_size_options(vec![2, 5]);
    let sink = MemorySink::new();
    let mut ctx = RunContext::new(page)
        .with_sink(sink.clone())
        .with_settings(settings);
    let report = verify(&schema, &mut ctx);

    assert!(sink.contains(
        "Failure: Jobs: Dropdown value changed after navigating back. Before: 5, After: 2"
    ));
    assert!(report.count_failures(FailureKind::NavigationRegression) >= 1);
}

#[test]
fn test_page_size_falls_back_to_smallest_option() {
    let schema = Jobs::with_records(abc());
    let page = page_for(&abc()).with_page_size_options(vec![2]);
    let sink = MemorySink::new();
    let mut ctx = RunContext::new(page.clone())
        .with_sink(sink.clone())
        .with_settings(settings().with_page_size_options(vec![2]));
    let report = verify(&schema, &mut ctx);

    assert_eq!(page.page_size(), 2);
    assert!(sink.contains("(JSON: 3, UI: 2)"));
    assert_eq!(report.count_failures(FailureKind::RowCountMismatch), 1);
}

#[test]
fn test_sort_state_that_never_changes_times_out() {
    let schema = Jobs::with_records(abc());
    let page = page_for(&abc()).with_frozen_sort_state("size");
    let (report, sink) = run(&schema, page);

    assert_eq!(report.count_failures(FailureKind::Timeout), 3);
    assert!(sink.contains("Failure: Jobs: Sort state of Size did not settle"));
    assert!(sink.contains("Values are correctly sorted in ascending order by: Status"));
}

#[test]
fn test_sort_state_that_settles_late_is_awaited() {
    let schema = Jobs::with_records(abc());
    let page = page_for(&abc()).with_lagging_sort_state("size", 3);
    let (report, sink) = run(&schema, page.clone());

    assert!(report.passed(), "unexpected failures: {:?}", sink.failures());
    assert_eq!(report.count_failures(FailureKind::Timeout), 0);
    let size_passes: Vec<_> = report
        .phase(Phase::Sorting)
        .filter(|c| c.subject == "Size" && c.passed())
        .map(|c| c.message.clone())
        .collect();
    assert_eq!(
        size_passes,
        vec![
            "Jobs: Values are correctly sorted in ascending order by: Size",
            "Jobs: Values are correctly sorted in descending order by: Size",
            "Jobs: Values are correctly sorted in ascending order by: Size",
        ]
    );
    assert_eq!(page.sort_state("size"), tablecheck::SortState::Ascending);
}

#[test]
fn test_unreadable_href_still_follows_link() {
    let schema = Jobs::with_records(abc());
    let page = page_for(&abc()).with_unreadable_href("A");
    let (report, sink) = run(&schema, page);

    assert!(report.passed(), "unexpected failures: {:?}", sink.failures());
    let lines: Vec<String> = sink.lines().iter().map(ToString::to_string).collect();
    assert!(lines.contains(&"Success: Jobs: Link Test Pass for 2. A. URL : ".to_string()));
    assert!(sink.contains("Link Test Pass for 1. B. URL : http://localhost/jobs#/details/B"));
}

#[test]
fn test_fixture_file_round_trip_with_declarative_schema() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[
            {{"id": "A", "status": "z", "size": 30}},
            {{"id": "B", "status": "x", "size": 4}},
            {{"id": "C", "status": "y", "size": 100}}
        ]"#
    )
    .unwrap();

    let typed = Jobs::new(JsonFileFixture::<Job>::new(file.path()));
    let (typed_report, _) = run(&typed, page_for(&abc()));
    assert!(typed_report.passed());

    let declarative = DeclarativeSchema::new(
        "Jobs",
        URL,
        JsonFileFixture::new(file.path()),
        ColumnSpec::new("id", "ID"),
        vec![
            ColumnDefinition::new("id", "ID").with_link(),
            ColumnDefinition::new("status", "Status"),
            ColumnDefinition::new("size", "Size").with_kind(ColumnKind::Integer),
        ],
    )
    .unwrap();
    let page = page_for(&abc());
    let sink = MemorySink::new();
    let mut ctx = RunContext::new(page.clone())
        .with_sink(sink.clone())
        .with_settings(settings());
    let report = Suite::new().with_test(declarative).run(&mut ctx);

    assert!(report.passed(), "unexpected failures: {:?}", sink.failures());
    assert_eq!(report.tables.len(), 1);
    assert!(page.is_closed());
}

#[test]
fn test_malformed_fixture_still_checks_headers_and_links() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"[{{"id": "A", "status": }}]"#).unwrap();

    let schema = Jobs::new(JsonFileFixture::<Job>::new(file.path()));
    let (report, sink) = run(&schema, page_for(&abc()));

    assert!(sink.contains("Failure: Jobs: Error in JSON Parsing:"));
    assert_eq!(report.count_failures(FailureKind::FixtureParseError), 1);
    assert!(report.phase(Phase::Headers).all(|c| c.passed()));
    assert!(report.phase(Phase::Links).filter(|c| c.passed()).count() >= 3);
}
