//! Utility functions for tools

use crate::error::AppError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Deserialize MCP tool arguments
pub fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, AppError> {
    serde_json::from_value(args).map_err(|e| AppError::InvalidInput(format!("Invalid arguments: {}", e)))
}

/// Read a JSON document from disk
pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let data = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AppError::NotFound(format!("File not found: {}", path.display())),
        _ => AppError::Io(format!("Failed to read {}: {}", path.display(), e)),
    })?;
    serde_json::from_str(&data)
        .map_err(|e| AppError::InvalidInput(format!("Invalid JSON in {}: {}", path.display(), e)))
}

/// Amount in soles, e.g. `S/ 39.00`
pub fn format_money(amount: f64) -> String {
    format!("S/ {:.2}", amount)
}

/// Escape characters that would break a markdown table cell
pub fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
