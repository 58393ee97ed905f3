//! Error types for the extraction module

use std::path::PathBuf;

use thiserror::Error;

/// Error type for reading and writing report documents
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The file could not be read or written
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not well-formed JSON
    #[error("{} is not valid JSON: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The document could not be serialized
    #[error("failed to encode JSON: {0}")]
    Encode(#[source] serde_json::Error),
}
