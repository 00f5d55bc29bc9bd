//! Record source boundary trait for testability
//!
//! The resolver never fetches anything itself. A `RecordSource` stands in for
//! the data-fetch collaborator, so services can be tested with in-memory
//! records.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use crate::domain::RawCaRecord;
use crate::infrastructure::{InfraError, InfraResult};

/// Delivers the raw CA record collection.
pub trait RecordSource: Send + Sync {
    /// Fetch the complete record collection.
    fn fetch(&self) -> InfraResult<Vec<RawCaRecord>>;

    /// Human readable origin, used in log and error messages.
    fn describe(&self) -> String;
}

/// Reads a JSON array of CA records from a file.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse a JSON array of CA records.
///
/// An empty or whitespace-only document is an empty collection. Entries are
/// decoded one by one: an undecodable entry becomes a
/// [`RawCaRecord::malformed`] placeholder at its position, so only a document
/// that is not a JSON array fails as a whole.
pub fn parse_records(content: &str) -> Result<Vec<RawCaRecord>, serde_json::Error> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let entries: Vec<serde_json::Value> = serde_json::from_str(content)?;
    Ok(entries
        .into_iter()
        .enumerate()
        .map(|(position, entry)| {
            serde_json::from_value(entry).unwrap_or_else(|e| {
                warn!(position, "undecodable CA record: {e}");
                RawCaRecord::malformed(e.to_string())
            })
        })
        .collect())
}

impl RecordSource for JsonFileSource {
    #[instrument(level = "debug", skip(self))]
    fn fetch(&self) -> InfraResult<Vec<RawCaRecord>> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| InfraError::io(format!("read {}", self.path.display()), e))?;
        let records = parse_records(&content)
            .map_err(|e| InfraError::parse(format!("parse {}", self.path.display()), e))?;
        debug!("fetched {} records from {}", records.len(), self.path.display());
        Ok(records)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory record collection.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<RawCaRecord>,
}

impl StaticSource {
    pub fn new(records: Vec<RawCaRecord>) -> Self {
        Self { records }
    }
}

impl RecordSource for StaticSource {
    fn fetch(&self) -> InfraResult<Vec<RawCaRecord>> {
        Ok(self.records.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory records", self.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn given_json_file_when_fetching_then_returns_records() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cas.json");
        std::fs::write(
            &path,
            r#"[{"id": 1, "name": "Root", "subjectName": "CN=Root", "issuerName": "CN=Root"}]"#,
        )
        .unwrap();

        let records = JsonFileSource::new(&path).fetch().unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Root");
    }

    #[test]
    fn given_missing_file_when_fetching_then_io_error() {
        let source = JsonFileSource::new("/nonexistent/cas.json");
        assert!(matches!(source.fetch(), Err(InfraError::Io { .. })));
    }

    #[test]
    fn given_malformed_json_when_fetching_then_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cas.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = JsonFileSource::new(&path).fetch();
        assert!(matches!(result, Err(InfraError::Parse { .. })));
    }

    #[test]
    fn given_blank_document_when_parsing_then_empty() {
        assert!(parse_records("  \n").unwrap().is_empty());
    }

    #[test]
    fn given_null_and_undecodable_entries_when_parsing_then_only_bad_entries_flagged() {
        let records = parse_records(
            r#"[
                {"id": 1, "name": "Root", "subjectName": "CN=Root", "issuerName": "CN=Root"},
                {"id": 2, "name": null, "certCount": null, "issuerName": "CN=Root"},
                {"id": 3, "certCount": "lots"},
                42
            ]"#,
        )
        .unwrap();

        assert_eq!(records.len(), 4);
        assert!(records[0].defect.is_none());
        assert!(records[1].defect.is_none());
        assert!(records[1].name.is_empty());
        assert!(records[2].defect.is_some());
        assert!(records[3].defect.is_some());
    }

    #[test]
    fn given_document_that_is_not_an_array_when_parsing_then_error() {
        assert!(parse_records(r#"{"id": 1}"#).is_err());
    }
}
