//! Core types for heat map rollups.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier;
use crate::normalizer;
use crate::presenter::DisplayColor;
use crate::status::StatusValue;

/// A string that is not a canonical operation code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid operation code: {0:?}")]
pub struct InvalidCode(pub String);

/// Canonical operation code: a non-empty run of ASCII digits.
///
/// This is the join key between records, catalog and output. Build one with
/// [`OperationCode::parse`] for strict input or [`normalizer::normalize`] for
/// loosely typed input.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OperationCode(String);

impl OperationCode {
    /// Accept `code` only if it is already canonical.
    pub fn parse(code: &str) -> Option<Self> {
        if !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(code.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the code shape marks a parent (family summary) operation.
    pub fn is_parent(&self) -> bool {
        classifier::is_parent(&self.0)
    }

    /// The family code this sub-operation rolls up into, if derivable.
    pub fn parent(&self) -> Option<OperationCode> {
        classifier::parent_of(&self.0)
    }
}

impl TryFrom<String> for OperationCode {
    type Error = InvalidCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or(InvalidCode(value))
    }
}

impl From<OperationCode> for String {
    fn from(code: OperationCode) -> Self {
        code.0
    }
}

impl Borrow<str> for OperationCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for OperationCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An operation code as it appears in source data.
///
/// Spreadsheets and exports hand codes over as integers, floats
/// (`10101300.0`) or strings; the normalizer folds all of them together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum RawCode {
    Integer(i64),
    Float(f64),
    Text(String),
    #[default]
    Missing,
}

impl From<i64> for RawCode {
    fn from(value: i64) -> Self {
        RawCode::Integer(value)
    }
}

impl From<i32> for RawCode {
    fn from(value: i32) -> Self {
        RawCode::Integer(i64::from(value))
    }
}

impl From<u32> for RawCode {
    fn from(value: u32) -> Self {
        RawCode::Integer(i64::from(value))
    }
}

impl From<f64> for RawCode {
    fn from(value: f64) -> Self {
        RawCode::Float(value)
    }
}

impl From<&str> for RawCode {
    fn from(value: &str) -> Self {
        RawCode::Text(value.to_string())
    }
}

impl From<String> for RawCode {
    fn from(value: String) -> Self {
        RawCode::Text(value)
    }
}

impl From<&OperationCode> for RawCode {
    fn from(value: &OperationCode) -> Self {
        RawCode::Text(value.to_string())
    }
}

impl<T: Into<RawCode>> From<Option<T>> for RawCode {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RawCode::Missing)
    }
}

/// One evaluation row as read from a data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RawRecord {
    /// Operation code in whatever shape the source produced
    #[serde(default, alias = "opcode", alias = "OpCode")]
    pub code: RawCode,

    /// Operation label
    #[serde(default, alias = "operation_name", alias = "Operation")]
    pub operation: Option<String>,

    /// Final evaluation status text (RED, YELLOW, GREEN, N/A, ...)
    #[serde(default, alias = "final_status", alias = "Status")]
    pub status: Option<String>,
}

impl RawRecord {
    pub fn new(
        code: impl Into<RawCode>,
        operation: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            operation: Some(operation.into()),
            status: Some(status.into()),
        }
    }
}

/// A normalized evaluation row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub code: OperationCode,
    pub operation_name: String,
    pub status: StatusValue,
}

impl EvaluationRecord {
    pub fn new(
        code: OperationCode,
        operation_name: impl Into<String>,
        status: StatusValue,
    ) -> Self {
        Self {
            code,
            operation_name: operation_name.into(),
            status,
        }
    }

    /// Normalize a raw row. Returns `None` when the code cannot be normalized.
    pub fn from_raw(raw: &RawRecord) -> Option<Self> {
        let code = normalizer::normalize(&raw.code)?;
        Some(Self {
            code,
            operation_name: raw.operation.clone().unwrap_or_default(),
            status: StatusValue::from_raw(raw.status.as_deref()),
        })
    }
}

/// Which level of the hierarchy a node sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SubOperation,
    Parent,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::SubOperation => "Sub-operation",
            Role::Parent => "Parent operation",
        }
    }
}

/// An operation in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationNode {
    pub code: OperationCode,

    /// Human-readable name (e.g. "Drive away")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub is_parent: bool,

    /// Family this sub-operation rolls up into; always `None` for parents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_code: Option<OperationCode>,
}

impl OperationNode {
    /// Derive the node purely from the code shape.
    pub fn infer(code: OperationCode) -> Self {
        match classifier::classify(code.as_str()) {
            Some(Role::Parent) => Self::parent(code),
            _ => {
                let parent_code = code.parent();
                Self::sub_operation(code, parent_code)
            }
        }
    }

    pub fn parent(code: OperationCode) -> Self {
        Self {
            code,
            name: None,
            is_parent: true,
            parent_code: None,
        }
    }

    pub fn sub_operation(code: OperationCode, parent_code: Option<OperationCode>) -> Self {
        Self {
            code,
            name: None,
            is_parent: false,
            parent_code,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn role(&self) -> Role {
        if self.is_parent {
            Role::Parent
        } else {
            Role::SubOperation
        }
    }
}

/// Where a node's resolved status came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// Worst of the node's sub-operation statuses
    Children,
    /// Worst of the node's own evaluation records
    Direct,
    /// No usable data; only present when unresolved parents are emitted
    Unresolved,
}

/// A node after aggregation, before presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedNode {
    pub code: OperationCode,
    pub name: Option<String>,
    pub role: Role,
    pub status: StatusValue,
    pub source: ResolutionSource,
}

/// A rendered heat map cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupResult {
    pub code: OperationCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub role: Role,
    pub status: StatusValue,
    pub source: ResolutionSource,
    pub display_text: Option<String>,
    pub display_color: Option<DisplayColor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_code_parse() {
        assert!(OperationCode::parse("10101300").is_some());
        assert!(OperationCode::parse("").is_none());
        assert!(OperationCode::parse("1010a").is_none());
        assert!(OperationCode::parse("-1010").is_none());
        assert!(OperationCode::parse(" 1010").is_none());
    }

    #[test]
    fn test_operation_code_serde_rejects_non_digits() {
        let ok: Result<OperationCode, _> = serde_json::from_str("\"10100000\"");
        assert!(ok.is_ok());

        let bad: Result<OperationCode, _> = serde_json::from_str("\"10-100\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_raw_code_untagged_deserialize() {
        let codes: Vec<RawCode> =
            serde_json::from_str(r#"[10101300, 10101300.0, "10101300", null]"#).unwrap();

        assert_eq!(codes[0], RawCode::Integer(10101300));
        assert_eq!(codes[1], RawCode::Float(10101300.0));
        assert_eq!(codes[2], RawCode::Text("10101300".to_string()));
        assert_eq!(codes[3], RawCode::Missing);
    }

    #[test]
    fn test_raw_record_aliases() {
        let json = r#"{"OpCode": 10101300, "Operation": "Creep", "final_status": "RED"}"#;
        let record: RawRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.code, RawCode::Integer(10101300));
        assert_eq!(record.operation.as_deref(), Some("Creep"));
        assert_eq!(record.status.as_deref(), Some("RED"));
    }

    #[test]
    fn test_evaluation_record_from_raw() {
        let raw = RawRecord::new("10101300.0", "Creep", " red ");
        let record = EvaluationRecord::from_raw(&raw).unwrap();

        assert_eq!(record.code.as_str(), "10101300");
        assert_eq!(record.status, StatusValue::Red);

        let missing = RawRecord {
            code: RawCode::Missing,
            operation: None,
            status: Some("RED".to_string()),
        };
        assert!(EvaluationRecord::from_raw(&missing).is_none());
    }

    #[test]
    fn test_node_infer() {
        let parent = OperationNode::infer(OperationCode::parse("10100000").unwrap());
        assert!(parent.is_parent);
        assert_eq!(parent.parent_code, None);

        let child = OperationNode::infer(OperationCode::parse("10101300").unwrap());
        assert_eq!(child.role(), Role::SubOperation);
        assert_eq!(child.parent_code.unwrap().as_str(), "10100000");

        let short = OperationNode::infer(OperationCode::parse("101").unwrap());
        assert!(!short.is_parent);
        assert_eq!(short.parent_code, None);
    }
}
