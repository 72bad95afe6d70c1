use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::catalog::RuleCatalog;
use crate::errors::Result;

/// Emit the JSON Schema for `catalog.json`.
pub fn catalog_json_schema() -> RootSchema {
    schema_for!(RuleCatalog)
}

/// JSON Schema for `catalog.json` as a JSON value, ready for validation.
pub fn catalog_json_schema_value() -> Result<serde_json::Value> {
    Ok(serde_json::to_value(catalog_json_schema())?)
}
