//! Fixture loading.
//!
//! A fixture is the ground-truth record set a rendered table is checked
//! against: a JSON array of objects, parsed into an ordered `Vec` of records.
//! Any read or parse failure becomes [`TableCheckError::FixtureError`].

use crate::result::{TableCheckError, TableCheckResult};
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Untyped fixture record: one JSON object
pub type JsonRecord = serde_json::Map<String, serde_json::Value>;

/// Source of ordered fixture records
pub trait FixtureSource {
    /// Record type produced
    type Record;

    /// Load and parse every record, preserving file order.
    ///
    /// # Errors
    ///
    /// Returns [`TableCheckError::FixtureError`] if the source is missing,
    /// unreadable or malformed.
    fn load(&self) -> TableCheckResult<Vec<Self::Record>>;

    /// Human-readable name for log lines
    fn describe(&self) -> String;
}

/// Parse a JSON array of records
///
/// # Errors
///
/// Returns [`TableCheckError::FixtureError`] naming `source_name` when the
/// document is not an array of `T`.
pub fn parse_records<T: DeserializeOwned>(
    json: &str,
    source_name: &str,
) -> TableCheckResult<Vec<T>> {
    serde_json::from_str(json).map_err(|e| TableCheckError::FixtureError {
        source_name: source_name.to_string(),
        message: e.to_string(),
    })
}

/// Fixture read from a JSON file on disk
pub struct JsonFileFixture<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T> JsonFileFixture<T> {
    /// Create a fixture for the file at `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    /// Path of the fixture file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> fmt::Debug for JsonFileFixture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonFileFixture")
            .field("path", &self.path)
            .finish()
    }
}

impl<T> Clone for JsonFileFixture<T> {
    fn clone(&self) -> Self {
        Self::new(self.path.clone())
    }
}

impl<T: DeserializeOwned> FixtureSource for JsonFileFixture<T> {
    type Record = T;

    fn load(&self) -> TableCheckResult<Vec<T>> {
        let source_name = self.describe();
        let json =
            std::fs::read_to_string(&self.path).map_err(|e| TableCheckError::FixtureError {
                source_name: source_name.clone(),
                message: e.to_string(),
            })?;
        parse_records(&json, &source_name)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Fixture held in memory
#[derive(Debug, Clone)]
pub struct StaticFixture<T> {
    name: String,
    records: Vec<T>,
}

impl<T: Clone> StaticFixture<T> {
    /// Create an in-memory fixture
    #[must_use]
    pub fn new(name: impl Into<String>, records: Vec<T>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }
}

impl<T: Clone> FixtureSource for StaticFixture<T> {
    type Record = T;

    fn load(&self) -> TableCheckResult<Vec<T>> {
        Ok(self.records.clone())
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}
