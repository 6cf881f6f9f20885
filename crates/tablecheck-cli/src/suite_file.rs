//! YAML suite files.
//!
//! A suite file lists the tables of one application together with the
//! engine settings, the rendered-table contract and browser options:
//!
//! ```yaml
//! base_url: http://localhost:8010
//! settings:
//!   settle_delay_ms: 2000
//! browser:
//!   sandbox: false
//! tables:
//!   - name: Workunits
//!     url: /#/workunits
//!     fixture: fixtures/workunits.json
//!     identifier: { key: Wuid, name: WUID }
//!     columns:
//!       - { key: Wuid, name: WUID, link: true }
//!       - { key: State, name: State }
//!       - { key: TotalClusterTime, name: Total Cluster Time, kind: integer }
//! ```
//!
//! Fixture paths are resolved against the directory of the suite file.

use crate::error::{CliError, CliResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tablecheck::{
    BrowserConfig, ColumnDefinition, ColumnSpec, DeclarativeSchema, EngineSettings, FixtureSource,
    JsonFileFixture, JsonRecord, Suite, TableContract,
};

/// One table entry of a suite file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableConfig {
    /// Page name used in log lines
    pub name: String,
    /// Absolute URL, or a path joined to the suite's `base_url`
    pub url: String,
    /// JSON fixture, relative to the suite file
    pub fixture: PathBuf,
    /// Column naming rows in failure messages
    pub identifier: ColumnSpec,
    /// Declared columns in header order
    pub columns: Vec<ColumnDefinition>,
}

/// Parsed suite file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteConfig {
    /// Prefix for relative table URLs
    #[serde(default)]
    pub base_url: Option<String>,
    /// Engine settings
    #[serde(default)]
    pub settings: EngineSettings,
    /// Rendered-table contract
    #[serde(default)]
    pub contract: TableContract,
    /// Browser launch options
    #[serde(default)]
    pub browser: BrowserConfig,
    /// Tables to verify, in run order
    pub tables: Vec<TableConfig>,
    #[serde(skip)]
    root: PathBuf,
}

impl SuiteConfig {
    /// Read and parse a suite file
    pub fn load(path: &Path) -> CliResult<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            CliError::config(format!("cannot read suite file {}: {e}", path.display()))
        })?;
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_yaml(&yaml, root)
    }

    /// Parse a suite document whose relative fixture paths live under `root`
    pub fn from_yaml(yaml: &str, root: impl Into<PathBuf>) -> CliResult<Self> {
        let mut config: Self = serde_yaml_ng::from_str(yaml)?;
        config.root = root.into();
        Ok(config)
    }

    /// Replace the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Check settings, table names and URLs
    pub fn validate(&self) -> CliResult<()> {
        self.settings.validate()?;
        if self.tables.is_empty() {
            return Err(CliError::config("suite declares no tables"));
        }
        let mut names = HashSet::new();
        for table in &self.tables {
            if !names.insert(table.name.as_str()) {
                return Err(CliError::config(format!(
                    "table {} is declared twice",
                    table.name
                )));
            }
            self.table_url(table)?;
        }
        Ok(())
    }

    /// Absolute URL of a table
    pub fn table_url(&self, table: &TableConfig) -> CliResult<String> {
        if is_absolute_url(&table.url) {
            return Ok(table.url.clone());
        }
        let base = self.base_url.as_deref().ok_or_else(|| {
            CliError::config(format!(
                "table {} has relative url {} but no base_url is set",
                table.name, table.url
            ))
        })?;
        Ok(join_url(base, &table.url))
    }

    /// Fixture path of a table
    #[must_use]
    pub fn fixture_path(&self, table: &TableConfig) -> PathBuf {
        if table.fixture.is_absolute() {
            table.fixture.clone()
        } else {
            self.root.join(&table.fixture)
        }
    }

    /// Fixture source of a table
    #[must_use]
    pub fn fixture(&self, table: &TableConfig) -> JsonFileFixture<JsonRecord> {
        JsonFileFixture::new(self.fixture_path(table))
    }

    /// Schema for one table
    pub fn schema(&self, table: &TableConfig) -> CliResult<DeclarativeSchema> {
        Ok(DeclarativeSchema::new(
            table.name.clone(),
            self.table_url(table)?,
            self.fixture(table),
            table.identifier.clone(),
            table.columns.clone(),
        )?)
    }

    /// Suite of every table, in file order
    pub fn suite(&self) -> CliResult<Suite> {
        self.tables
            .iter()
            .try_fold(Suite::new(), |suite, table| Ok(suite.with_test(self.schema(table)?)))
    }

    /// Load the fixture of every table, reporting record counts or errors
    #[must_use]
    pub fn check_fixtures(&self) -> Vec<FixtureCheck> {
        self.tables
            .iter()
            .map(|table| {
                let fixture = self.fixture(table);
                FixtureCheck {
                    table: table.name.clone(),
                    source: fixture.describe(),
                    records: fixture
                        .load()
                        .map(|records| records.len())
                        .map_err(|e| e.to_string()),
                }
            })
            .collect()
    }
}

/// Outcome of loading one table's fixture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureCheck {
    /// Table name
    pub table: String,
    /// Fixture location
    pub source: String,
    /// Record count, or the load error
    pub records: Result<usize, String>,
}

fn is_absolute_url(url: &str) -> bool {
    ["http://", "https://", "file://"]
        .iter()
        .any(|scheme| url.starts_with(scheme))
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;
    use tablecheck::ColumnKind;
    use tempfile::TempDir;

    const SUITE: &str = r"
base_url: http://localhost:8010/
settings:
  settle_delay_ms: 0
  page_size_options: [10, 50]
browser:
  sandbox: false
tables:
  - name: Workunits
    url: /#/workunits
    fixture: fixtures/workunits.json
    identifier: { key: Wuid, name: WUID }
    columns:
      - { key: Wuid, name: WUID, link: true }
      - { key: State, name: State }
      - { key: TotalClusterTime, name: Total Cluster Time, kind: integer }
  - name: Queries
    url: https://example.test/queries
    fixture: /abs/queries.json
    identifier: { key: Id, name: ID }
    columns:
      - { key: Id, name: ID }
";

    fn parsed() -> SuiteConfig {
        SuiteConfig::from_yaml(SUITE, "/suites").unwrap()
    }

    mod parsing_tests {
        use super::*;

        #[test]
        fn test_parses_tables_and_sections() {
            let config = parsed();
            assert_eq!(config.tables.len(), 2);
            assert_eq!(config.settings.page_size_options, vec![10, 50]);
            assert_eq!(config.settings.settle_delay_ms, 0);
            assert!(!config.browser.sandbox);
            assert!(config.browser.headless);
            assert_eq!(config.contract, TableContract::default());

            let workunits = &config.tables[0];
            assert_eq!(workunits.identifier, ColumnSpec::new("Wuid", "WUID"));
            assert!(workunits.columns[0].link);
            assert_eq!(workunits.columns[2].kind, ColumnKind::Integer);
            assert_eq!(workunits.columns[1].kind, ColumnKind::Text);
        }

        #[test]
        fn test_unknown_keys_rejected() {
            let err = SuiteConfig::from_yaml("tables: []\nbogus: 1\n", ".").unwrap_err();
            assert!(matches!(err, CliError::Yaml(_)));
        }

        #[test]
        fn test_load_missing_file() {
            let err = SuiteConfig::load(Path::new("/nonexistent/suite.yaml")).unwrap_err();
            assert!(err.to_string().contains("cannot read suite file"));
        }
    }

    mod resolution_tests {
        use super::*;

        #[test]
        fn test_relative_url_joins_base() {
            let config = parsed();
            assert_eq!(
                config.table_url(&config.tables[0]).unwrap(),
                "http://localhost:8010/#/workunits"
            );
            assert_eq!(
                config.table_url(&config.tables[1]).unwrap(),
                "https://example.test/queries"
            );
        }

        #[test]
        fn test_base_url_override() {
            let config = parsed().with_base_url("http://qa:9000");
            assert_eq!(
                config.table_url(&config.tables[0]).unwrap(),
                "http://qa:9000/#/workunits"
            );
        }

        #[test]
        fn test_relative_url_without_base_fails() {
            let mut config = parsed();
            config.base_url = None;
            assert!(config.validate().is_err());
        }

        #[test]
        fn test_fixture_paths() {
            let config = parsed();
            assert_eq!(
                config.fixture_path(&config.tables[0]),
                PathBuf::from("/suites/fixtures/workunits.json")
            );
            assert_eq!(
                config.fixture_path(&config.tables[1]),
                PathBuf::from("/abs/queries.json")
            );
        }
    }

    mod validation_tests {
        use super::*;

        #[test]
        fn test_valid_suite() {
            parsed().validate().unwrap();
        }

        #[test]
        fn test_empty_suite() {
            let config = SuiteConfig::from_yaml("tables: []", ".").unwrap();
            assert!(config.validate().unwrap_err().to_string().contains("no tables"));
        }

        #[test]
        fn test_duplicate_table_names() {
            let mut config = parsed();
            config.tables[1].name = "Workunits".to_string();
            assert!(config.validate().unwrap_err().to_string().contains("twice"));
        }

        #[test]
        fn test_bad_settings() {
            let mut config = parsed();
            config.settings.page_size_options = vec![50, 10];
            assert!(matches!(
                config.validate().unwrap_err(),
                CliError::TableCheck(_)
            ));
        }

        #[test]
        fn test_suite_builds_every_schema() {
            let suite = parsed().suite().unwrap();
            assert_eq!(suite.names(), vec!["Workunits", "Queries"]);
        }

        #[test]
        fn test_duplicate_columns_rejected() {
            let mut config = parsed();
            let duplicate = config.tables[1].columns[0].clone();
            config.tables[1].columns.push(duplicate);
            assert!(config.suite().is_err());
        }
    }

    #[test]
    fn test_check_fixtures() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("fixtures")).unwrap();
        fs::write(
            dir.path().join("fixtures/workunits.json"),
            r#"[{"Wuid": "W1"}, {"Wuid": "W2"}]"#,
        )
        .unwrap();
        let config = SuiteConfig::from_yaml(SUITE, dir.path()).unwrap();

        let checks = config.check_fixtures();
        assert_eq!(checks.len(), 2);
        assert_eq!(checks[0].records, Ok(2));
        assert!(checks[1].records.is_err());
        assert_eq!(checks[1].source, "/abs/queries.json");
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://a/", "/b"), "http://a/b");
        assert_eq!(join_url("http://a", "b"), "http://a/b");
    }
}
