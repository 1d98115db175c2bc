//! Result and error types for the core library

use thiserror::Error;

/// Core library error type
///
/// Variants follow the import error taxonomy: file-level parse failures
/// abort the upload, mapping gaps block progression with the missing
/// labels, and a commit that lands zero rows is an aggregate failure.
/// Row-level data problems are never errors; they default leniently.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not parse file: {0}")]
    Parse(String),

    #[error("Missing required column assignments: {}", .0.join(", "))]
    MappingIncomplete(Vec<String>),

    #[error("Operation not allowed in stage '{0}'")]
    InvalidState(&'static str),

    #[error("Store error: {0}")]
    Store(String),

    #[error("No authenticated user")]
    Unauthenticated,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No receivable could be imported")]
    NothingImported,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_error_lists_missing_labels() {
        let err = Error::MappingIncomplete(vec!["client".to_string(), "amount".to_string()]);
        let msg = err.to_string();
        assert!(msg.contains("client"));
        assert!(msg.contains("amount"));
    }

    #[test]
    fn test_helper_constructors() {
        assert!(matches!(Error::parse("bad header"), Error::Parse(_)));
        assert!(matches!(Error::store("connection reset"), Error::Store(_)));
    }
}
