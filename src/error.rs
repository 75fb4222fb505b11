//! Error types for the persistence and import boundaries.
//!
//! The mutation engine and history never fail; only reading and writing the
//! store and accepting imported documents can.

use thiserror::Error;

/// Failure talking to the key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("stored value for key {key} is not valid JSON: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("store rejected write for key {key}: {reason}")]
    Rejected { key: String, reason: String },
}

/// Failure accepting an imported or persisted document.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid import format: {0}")]
    InvalidShape(&'static str),
    #[error("import could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}
