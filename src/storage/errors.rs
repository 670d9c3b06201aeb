//! Storage error types
//!
//! Error codes:
//! - STORAGE_IO_ERROR
//! - STORAGE_WRITE_FAILED
//! - STORAGE_READ_FAILED
//! - DATA_CORRUPTION
//! - DATASET_NOT_FOUND
//! - ROW_ARITY_MISMATCH
//! - INVALID_DATASET_NAME

use std::fmt;
use std::io;

/// Storage-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    /// Disk I/O failure outside a read or write path
    IoError,
    /// Unit write, fsync or rename failed
    WriteFailed,
    /// Unit read failed
    ReadFailed,
    /// Record failed checksum or framing validation
    DataCorruption,
    /// No committed unit for the dataset name
    DatasetNotFound,
    /// Row length differs from the unit's column count
    RowArityMismatch,
    /// Name cannot be used as a dataset name
    InvalidDatasetName,
}

impl StorageErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::IoError => "STORAGE_IO_ERROR",
            StorageErrorCode::WriteFailed => "STORAGE_WRITE_FAILED",
            StorageErrorCode::ReadFailed => "STORAGE_READ_FAILED",
            StorageErrorCode::DataCorruption => "DATA_CORRUPTION",
            StorageErrorCode::DatasetNotFound => "DATASET_NOT_FOUND",
            StorageErrorCode::RowArityMismatch => "ROW_ARITY_MISMATCH",
            StorageErrorCode::InvalidDatasetName => "INVALID_DATASET_NAME",
        }
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Storage error type with full context
#[derive(Debug)]
pub struct StorageError {
    /// Error code
    code: StorageErrorCode,
    /// Human-readable message
    message: String,
    /// Optional details about the error context
    details: Option<String>,
    /// Underlying IO error if applicable
    source: Option<io::Error>,
}

impl StorageError {
    fn new(code: StorageErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    fn with_source(mut self, source: io::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a new storage I/O error
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(StorageErrorCode::IoError, message).with_source(source)
    }

    /// Create a new write failed error
    pub fn write_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(StorageErrorCode::WriteFailed, message).with_source(source)
    }

    /// Create a new read failed error
    pub fn read_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(StorageErrorCode::ReadFailed, message).with_source(source)
    }

    /// Create a data corruption error with byte offset context
    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        let mut err = Self::new(StorageErrorCode::DataCorruption, reason);
        err.details = Some(format!("byte_offset: {}", offset));
        err
    }

    /// Create a dataset not found error
    pub fn dataset_not_found(name: &str) -> Self {
        Self::new(
            StorageErrorCode::DatasetNotFound,
            format!("Dataset '{}' has no ingested data", name),
        )
    }

    /// Create a row arity mismatch error for the 1-based data row `row`
    pub fn row_arity_mismatch(row: u64, expected: usize, found: usize) -> Self {
        let mut err = Self::new(
            StorageErrorCode::RowArityMismatch,
            format!("Row {} has {} fields, expected {}", row, found, expected),
        );
        err.details = Some(format!("row: {}", row));
        err
    }

    /// Create an invalid dataset name error
    pub fn invalid_dataset_name(name: &str) -> Self {
        Self::new(
            StorageErrorCode::InvalidDatasetName,
            format!("'{}' is not a valid dataset name", name),
        )
    }

    /// Returns the error code
    pub fn code(&self) -> StorageErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Kind of the underlying I/O error, if any
    pub fn source_io_kind(&self) -> Option<io::ErrorKind> {
        self.source.as_ref().map(io::Error::kind)
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        if let Some(ref source) = self.source {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(StorageErrorCode::DataCorruption.code(), "DATA_CORRUPTION");
        assert_eq!(StorageErrorCode::DatasetNotFound.code(), "DATASET_NOT_FOUND");
        assert_eq!(StorageErrorCode::RowArityMismatch.code(), "ROW_ARITY_MISMATCH");
    }

    #[test]
    fn test_error_display_contains_context() {
        let err = StorageError::corruption_at_offset(1024, "checksum mismatch");
        let display = format!("{}", err);
        assert!(display.contains("DATA_CORRUPTION"));
        assert!(display.contains("checksum mismatch"));
        assert!(display.contains("byte_offset: 1024"));

        let err = StorageError::row_arity_mismatch(7, 3, 2);
        assert!(err.to_string().contains("Row 7 has 2 fields, expected 3"));
    }
}
