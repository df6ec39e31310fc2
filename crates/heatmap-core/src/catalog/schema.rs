//! Shape checks for catalog documents.
//!
//! The embedded schema pins what a single document may contain: an
//! `operations` list whose entries carry a non-negative numeric or non-empty
//! string `code` and nothing beyond `name`, `parent` and `parent_code`.
//! Rules spanning several entries (duplicate codes, parent links) are
//! checked by the parser once codes are normalized.

use std::sync::OnceLock;

use serde_json::Value;
use thiserror::Error;

const CATALOG_SCHEMA: &str = include_str!("../../../../schema/catalog.schema.json");

static VALIDATOR: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The embedded schema itself could not be parsed or compiled.
    #[error("Catalog schema unavailable: {0}")]
    Unavailable(String),

    /// One entry per offending location, e.g. `/operations/2/code: ...`.
    #[error("{}", .0.join("; "))]
    Violations(Vec<String>),
}

fn compile() -> Result<jsonschema::Validator, String> {
    let schema: Value = serde_json::from_str(CATALOG_SCHEMA)
        .map_err(|e| format!("embedded schema is not JSON: {}", e))?;
    jsonschema::options()
        .build(&schema)
        .map_err(|e| format!("embedded schema does not compile: {}", e))
}

fn validator() -> Result<&'static jsonschema::Validator, SchemaError> {
    VALIDATOR
        .get_or_init(compile)
        .as_ref()
        .map_err(|e| SchemaError::Unavailable(e.clone()))
}

/// Check a catalog document before it is deserialized.
///
/// Every violation is reported, prefixed with the JSON pointer of the value
/// at fault (`/` for the document root).
pub fn validate_catalog_schema(document: &Value) -> Result<(), SchemaError> {
    let violations: Vec<String> = validator()?
        .iter_errors(document)
        .map(|error| {
            let location = error.instance_path.to_string();
            let location = if location.is_empty() { "/".to_string() } else { location };
            format!("{}: {}", location, error)
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::Violations(violations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn violations(document: Value) -> Vec<String> {
        match validate_catalog_schema(&document) {
            Err(SchemaError::Violations(found)) => found,
            other => panic!("expected violations, got {:?}", other),
        }
    }

    #[test]
    fn test_mixed_code_shapes_pass() {
        let document = json!({
            "name": "Test",
            "operations": [
                { "code": 10100000, "name": "Drive away", "parent": true },
                { "code": "10101300", "name": "Creep", "parent_code": 10100000 },
                { "code": 10101100.0 }
            ]
        });
        assert_eq!(validate_catalog_schema(&document), Ok(()));
    }

    #[test]
    fn test_missing_operations_reported_at_root() {
        let found = violations(json!({ "name": "Test" }));
        assert_eq!(found.len(), 1);
        assert!(found[0].starts_with("/:"));
    }

    #[test]
    fn test_unknown_entry_field() {
        let found = violations(json!({
            "operations": [{ "code": "10100000", "colour": "red" }]
        }));
        assert!(found[0].starts_with("/operations/0"));
    }

    #[test]
    fn test_invalid_codes_each_reported() {
        let found = violations(json!({
            "operations": [
                { "code": true },
                { "code": 10101300 },
                { "code": -10100000 }
            ]
        }));
        assert_eq!(found.len(), 2);
        assert!(found[0].starts_with("/operations/0/code"));
        assert!(found[1].starts_with("/operations/2/code"));
    }
}
