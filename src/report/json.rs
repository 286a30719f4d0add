//! JSON output.

use super::Report;
use crate::error::{CheckError, Result};

/// Pretty-printed JSON of `report`.
pub fn to_json(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(|e| CheckError::Other(e.into()))
}

/// Pretty-printed JSON schema of [`Report`].
pub fn schema() -> Result<String> {
    let schema = schemars::schema_for!(Report);
    serde_json::to_string_pretty(&schema).map_err(|e| CheckError::Other(e.into()))
}
