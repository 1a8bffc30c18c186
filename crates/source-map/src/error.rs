//! Source map error types.

use thiserror::Error;

/// An error produced while building or reading a source map.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceMapError {
    /// The `sourcemap` crate rejected the map.
    #[error("invalid source map: {0}")]
    Encoding(String),

    /// JSON (de)serialization failed.
    #[error("invalid source map json: {0}")]
    Json(String),
}

impl From<sourcemap::Error> for SourceMapError {
    fn from(err: sourcemap::Error) -> Self {
        SourceMapError::Encoding(err.to_string())
    }
}

impl From<serde_json::Error> for SourceMapError {
    fn from(err: serde_json::Error) -> Self {
        SourceMapError::Json(err.to_string())
    }
}
