//! Catalog parsing from YAML/JSON.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier;
use crate::normalizer::normalize;
use crate::types::{EvaluationRecord, OperationCode, OperationNode, RawCode};

use super::schema::validate_catalog_schema;

/// Errors that can occur when loading catalogs.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Catalog does not match schema: {0}")]
    SchemaViolation(String),

    #[error("Catalog validation failed: {0}")]
    ValidationError(String),

    #[error("Invalid operation code in catalog: {0}")]
    InvalidCode(String),

    #[error("Unsupported catalog format: {0}")]
    UnsupportedFormat(String),
}

/// The AVL-DRIVE rating families and their sub-operations.
///
/// Roles and parent links follow from the code shape.
pub const AVL_DRIVE_OPERATIONS: &[(&str, &str)] = &[
    ("10000000", "AVL-DRIVE Rating"),
    ("10100000", "Drive away"),
    ("10101300", "Creep"),
    ("10101100", "Standing start"),
    ("10102400", "Rolling start"),
    ("10120000", "Acceleration"),
    ("10120100", "Full load"),
    ("10120200", "Constant load"),
    ("10120300", "Load increase"),
    ("10120900", "Load decrease"),
    ("10030000", "Tip in"),
    ("10030100", "At deceleration"),
    ("10030200", "At constant speed / acceleration"),
    ("10040000", "Tip out"),
    ("10040300", "At constant speed / acceleration"),
    ("10040400", "At deceleration"),
    ("10070000", "Deceleration"),
    ("10070500", "Without brake"),
    ("10070100", "Transition to constant speed"),
    ("10071000", "Constant Brake"),
    ("10090000", "Gear shift"),
    ("10092300", "Power-on upshift"),
    ("10092500", "Tip out upshift"),
    ("10098400", "Load reversal upshift"),
    ("10092100", "Coast / brake-on upshift"),
    ("10093200", "Power-on downshift"),
    ("10093100", "Kick down / tip in downshift"),
    ("10093400", "Coast / brake-on downshift"),
    ("10097800", "Maneuvering"),
    ("10097900", "Selector lever change"),
];

/// One operation as written in a catalog document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Operation code, normalized on load
    pub code: RawCode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Explicit role; inferred from the code shape when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<bool>,

    /// Explicit parent link; inferred from the code shape when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_code: Option<RawCode>,
}

/// A catalog document as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub operations: Vec<CatalogEntry>,
}

/// An operation catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    name: String,
    operations: Vec<OperationNode>,
    index: HashMap<OperationCode, usize>,
}

impl Catalog {
    /// Build a catalog from explicit nodes.
    pub fn new(
        name: impl Into<String>,
        operations: Vec<OperationNode>,
    ) -> Result<Self, CatalogError> {
        Self::validate(&operations)?;
        Ok(Self::build(name.into(), operations))
    }

    /// Parse a catalog from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse a catalog from JSON string.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse a catalog from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse a catalog from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse a catalog file, picking the format from its extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_file(path),
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            other => Err(CatalogError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    /// Validate a parsed document against the schema, then build from it.
    pub fn from_value(value: serde_json::Value) -> Result<Self, CatalogError> {
        validate_catalog_schema(&value)
            .map_err(|err| CatalogError::SchemaViolation(err.to_string()))?;

        let document: CatalogDocument = serde_json::from_value(value)?;
        Self::from_document(document)
    }

    /// Build from a document, normalizing codes and filling in inferred roles.
    pub fn from_document(document: CatalogDocument) -> Result<Self, CatalogError> {
        let mut operations = Vec::with_capacity(document.operations.len());

        for entry in document.operations {
            let code = normalize(&entry.code)
                .ok_or_else(|| CatalogError::InvalidCode(format!("{:?}", entry.code)))?;

            let is_parent = entry.parent.unwrap_or_else(|| code.is_parent());

            let parent_code = match (is_parent, entry.parent_code) {
                (true, Some(_)) => {
                    return Err(CatalogError::ValidationError(format!(
                        "Parent operation {} cannot declare a parent_code",
                        code
                    )));
                }
                (true, None) => None,
                (false, Some(raw)) => Some(
                    normalize(&raw).ok_or_else(|| CatalogError::InvalidCode(format!("{:?}", raw)))?,
                ),
                (false, None) => code.parent().filter(|parent| *parent != code),
            };

            let node = OperationNode {
                code,
                name: entry.name,
                is_parent,
                parent_code,
            };
            operations.push(node);
        }

        Self::new(document.name.unwrap_or_default(), operations)
    }

    /// Derive a catalog from code shape alone.
    ///
    /// Every code is classified with the classifier, and the derived parent
    /// of every sub-operation is added as well so families are reported even
    /// when the family row itself has no data. The first non-empty label seen
    /// for a code becomes its name. Duplicates are dropped.
    pub fn infer<I>(name: impl Into<String>, operations: I) -> Self
    where
        I: IntoIterator<Item = (OperationCode, Option<String>)>,
    {
        let mut positions: HashMap<OperationCode, usize> = HashMap::new();
        let mut nodes: Vec<OperationNode> = Vec::new();

        for (code, label) in operations {
            let label = label
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty());
            let derived_parent = if code.is_parent() { None } else { code.parent() };

            match positions.get(&code) {
                Some(&position) => {
                    let node = &mut nodes[position];
                    if node.name.is_none() {
                        node.name = label;
                    }
                }
                None => {
                    positions.insert(code.clone(), nodes.len());
                    let mut node = OperationNode::infer(code);
                    node.name = label;
                    nodes.push(node);
                }
            }

            if let Some(parent) = derived_parent {
                if !positions.contains_key(&parent) {
                    positions.insert(parent.clone(), nodes.len());
                    nodes.push(OperationNode::infer(parent));
                }
            }
        }

        Self::build(name.into(), nodes)
    }

    /// Derive a catalog from the codes and operation labels of `records`.
    pub fn infer_from_records(name: impl Into<String>, records: &[EvaluationRecord]) -> Self {
        let operations = records
            .iter()
            .map(|record| (record.code.clone(), Some(record.operation_name.clone())));
        Self::infer(name, operations)
    }

    /// The built-in AVL-DRIVE catalog.
    pub fn avl_drive() -> Self {
        let operations = AVL_DRIVE_OPERATIONS
            .iter()
            .filter_map(|(code, name)| {
                OperationCode::parse(code).map(|code| OperationNode::infer(code).with_name(*name))
            })
            .collect();

        Self::build("AVL-DRIVE".to_string(), operations)
    }

    fn build(name: String, operations: Vec<OperationNode>) -> Self {
        let mut index = HashMap::with_capacity(operations.len());
        for (position, node) in operations.iter().enumerate() {
            index.entry(node.code.clone()).or_insert(position);
        }

        Self {
            name,
            operations,
            index,
        }
    }

    /// Check structural rules the schema cannot express.
    fn validate(operations: &[OperationNode]) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for node in operations {
            if !seen.insert(&node.code) {
                return Err(CatalogError::ValidationError(format!(
                    "Duplicate operation code: {}",
                    node.code
                )));
            }
        }

        let parents: HashMap<&OperationCode, bool> = operations
            .iter()
            .map(|node| (&node.code, node.is_parent))
            .collect();

        for node in operations {
            match (&node.parent_code, node.is_parent) {
                (Some(_), true) => {
                    return Err(CatalogError::ValidationError(format!(
                        "Parent operation {} cannot declare a parent_code",
                        node.code
                    )));
                }
                (Some(parent), false) if *parent == node.code => {
                    return Err(CatalogError::ValidationError(format!(
                        "Sub-operation {} cannot be its own parent",
                        node.code
                    )));
                }
                (Some(parent), false) if parents.get(parent) == Some(&false) => {
                    return Err(CatalogError::ValidationError(format!(
                        "Parent code {} of {} is a sub-operation",
                        parent, node.code
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Convert back into the on-disk document shape.
    pub fn to_document(&self) -> CatalogDocument {
        CatalogDocument {
            name: (!self.name.is_empty()).then(|| self.name.clone()),
            operations: self
                .operations
                .iter()
                .map(|node| CatalogEntry {
                    code: RawCode::from(&node.code),
                    name: node.name.clone(),
                    parent: Some(node.is_parent),
                    parent_code: node.parent_code.as_ref().map(RawCode::from),
                })
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All operations in catalog order.
    pub fn operations(&self) -> &[OperationNode] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn get(&self, code: &str) -> Option<&OperationNode> {
        self.index.get(code).map(|&position| &self.operations[position])
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    /// Whether `code` is a parent operation in this catalog.
    pub fn is_parent_code(&self, code: &str) -> bool {
        self.get(code).is_some_and(|node| node.is_parent)
    }

    pub fn parents(&self) -> impl Iterator<Item = &OperationNode> {
        self.operations.iter().filter(|node| node.is_parent)
    }

    pub fn sub_operations(&self) -> impl Iterator<Item = &OperationNode> {
        self.operations.iter().filter(|node| !node.is_parent)
    }

    /// Sub-operations linked to `code`, in catalog order.
    pub fn children_of(&self, code: &str) -> Vec<&OperationNode> {
        self.sub_operations()
            .filter(|node| node.parent_code.as_ref().is_some_and(|p| p.as_str() == code))
            .collect()
    }

    /// Codes whose role contradicts their shape (explicitly overridden).
    pub fn shape_overrides(&self) -> Vec<&OperationCode> {
        self.operations
            .iter()
            .filter(|node| classifier::is_parent(node.code.as_str()) != node.is_parent)
            .map(|node| &node.code)
            .collect()
    }
}
