//! Operation catalogs.
//!
//! A catalog is the injectable set of operations a heat map reports on.
//! It is loaded from YAML/JSON (validated against an embedded JSON Schema),
//! inferred from code shape, or taken from the built-in AVL-DRIVE table.

mod parser;
mod schema;

pub use parser::{Catalog, CatalogEntry, CatalogError, CatalogDocument, AVL_DRIVE_OPERATIONS};
pub use schema::{validate_catalog_schema, SchemaError};
