//! JSON document helpers
//!
//! Persisted reports are written as UTF-8 with 4-space indentation and non-ASCII text
//! kept as-is; prompts embed documents with 2-space indentation. Both go through
//! `to_pretty_json` so the output is byte-for-byte reproducible.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::extract::ExtractError;

/// Indentation of JSON files written to disk
pub const FILE_JSON_INDENT: usize = 4;

/// Indentation of JSON embedded in prompts
pub const PROMPT_JSON_INDENT: usize = 2;

/// Serialize `value` as indented JSON
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T, indent: usize) -> serde_json::Result<String> {
    let indent = " ".repeat(indent);
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    // serde_json only ever emits valid UTF-8
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Read and decode a JSON file
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ExtractError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&text).map_err(|source| ExtractError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Encode `value` with `FILE_JSON_INDENT` and write it to `path`
pub async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ExtractError> {
    let text = to_pretty_json(value, FILE_JSON_INDENT).map_err(ExtractError::Encode)?;
    write_text(path, &text).await
}

/// Write UTF-8 text, creating parent directories as needed
pub async fn write_text(path: &Path, text: &str) -> Result<(), ExtractError> {
    let io_error = |source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
    }
    tokio::fs::write(path, text).await.map_err(io_error)
}
