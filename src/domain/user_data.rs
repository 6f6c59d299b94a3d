//! User supplied JSON attached to payloads.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// Load a JSON document to attach as `user_data`.
///
/// No path means an empty object.
pub fn load_user_data(path: Option<&Path>) -> Result<Value> {
    let Some(path) = path else {
        return Ok(Value::Object(Default::default()));
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read user data file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse user data file as JSON: {}", path.display()))
}
