//! Rule contracts, catalog and rule definition linting.

pub mod catalog;
pub mod errors;
pub mod model;
pub mod persist;
pub mod schema;
pub mod source;
pub mod structure;
pub mod validate;

pub use catalog::{Project, RuleAssignment, RuleCatalog};
pub use errors::{IssueSeverity, Result, RuleError, ValidationIssue, ValidationReport};
pub use model::{
    FileContentMatchRule, FilePresenceRule, FolderStructureRule, MatchType, MaxSizeFileRule,
    Rule, RuleKind, RuleType, StructureSource,
};
pub use persist::{write_bytes_atomic, write_json_document};
pub use schema::{catalog_json_schema, catalog_json_schema_value};
pub use source::{DeliverableRules, RuleSource};
pub use structure::{FILE_MARKER, FolderNode, FolderTree, StructureError};
pub use validate::{
    ValidatedCatalog, load_catalog_document, rule_issues, validate_catalog,
    validate_catalog_document, validate_catalog_json,
};
