// src/utils/serialization.rs
//! JSON helpers shared by the registry store and the CLI.
//!
//! Documents are written human-readable: two-space indentation, struct field
//! order as declared, non-ASCII text left unescaped.

use serde::{de::DeserializeOwned, Serialize};

/// Serializes a value to indented JSON followed by a newline.
///
/// # Returns
/// - `Ok(String)` with the JSON text
/// - `Err(serde_json::Error)` if the value cannot be represented as JSON
pub fn to_pretty_json<T: Serialize>(data: &T) -> Result<String, serde_json::Error> {
    let mut text = serde_json::to_string_pretty(data)?;
    text.push('\n');
    Ok(text)
}

/// Deserializes a value from JSON text.
pub fn from_json<T: DeserializeOwned>(data: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(data)
}
