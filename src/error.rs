// src/error.rs

pub type Result<T> = std::result::Result<T, Error>;

/// Error types for store operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed configuration: {0}")]
    MalformedConfig(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status}")]
    Protocol { status: u16 },

    #[error("Failed to create {kind} (HTTP status {status})")]
    CreateFailed { kind: &'static str, status: u16 },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Filter value must be a string, int or float, got {0}")]
    UnsupportedFilterValue(&'static str),

    #[error("Query returned no result batches")]
    InsufficientResults,
}
