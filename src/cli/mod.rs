//! CLI subcommand implementations for the bundlesnap binary.

pub mod detect_cmd;
pub mod extract_cmd;
pub mod output;

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

/// Load an optional window-state JSON dump from disk.
pub(crate) fn load_state(path: Option<&Path>) -> Result<Option<Value>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read state file {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("state file {} is not valid JSON", path.display()))?;
    Ok(Some(value))
}
