//! Loading raw evaluation rows.
//!
//! Rows are stored as a JSON or YAML array:
//!
//! ```yaml
//! - code: 10101300
//!   operation: Creep
//!   status: RED
//! - code: "10101100.0"
//!   operation: Standing start
//!   status: green
//! ```

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::types::{EvaluationRecord, RawRecord};

/// Errors that can occur when loading records.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Failed to read records file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unsupported records format: {0}")]
    UnsupportedFormat(String),
}

/// Parse rows from a JSON array.
pub fn records_from_json(json: &str) -> Result<Vec<RawRecord>, RecordError> {
    Ok(serde_json::from_str(json)?)
}

/// Parse rows from a YAML sequence. An empty document is an empty set.
pub fn records_from_yaml(yaml: &str) -> Result<Vec<RawRecord>, RecordError> {
    if yaml.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_yaml::from_str(yaml)?)
}

/// Load rows from a file, picking the format from its extension.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<RawRecord>, RecordError> {
    let path = path.as_ref();
    let extension = path.extension().and_then(|e| e.to_str());
    let parse: fn(&str) -> Result<Vec<RawRecord>, RecordError> = match extension {
        Some("json") => records_from_json,
        Some("yaml") | Some("yml") => records_from_yaml,
        other => {
            return Err(RecordError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            ))
        }
    };

    let contents = fs::read_to_string(path)?;
    parse(&contents)
}

/// Normalize rows, dropping those whose code cannot be normalized.
pub fn normalize_records(rows: &[RawRecord]) -> Vec<EvaluationRecord> {
    rows.iter().filter_map(EvaluationRecord::from_raw).collect()
}
