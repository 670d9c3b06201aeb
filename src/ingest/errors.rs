//! Ingestion error types

use thiserror::Error;

use crate::schema::SchemaError;
use crate::storage::StorageError;

/// Result type for ingestion
pub type IngestResult<T> = Result<T, IngestError>;

/// Errors that abort an ingestion run.
///
/// Every variant leaves the previously committed dataset untouched.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Upload is not a recognized delimited file, or cannot be decoded
    #[error("Invalid upload: {0}")]
    InvalidFormat(String),

    /// Header record could not produce a schema
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Staging, row validation or commit failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IngestError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            IngestError::InvalidFormat(_) => "INVALID_FORMAT",
            IngestError::Schema(e) => e.code(),
            IngestError::Storage(e) => e.code().code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(
            IngestError::InvalidFormat("x".into()).code(),
            "INVALID_FORMAT"
        );
        assert_eq!(IngestError::from(SchemaError::EmptySchema).code(), "EMPTY_SCHEMA");
        assert_eq!(
            IngestError::from(StorageError::row_arity_mismatch(3, 2, 1)).code(),
            "ROW_ARITY_MISMATCH"
        );
    }
}
