//! API error types
//!
//! API errors are pass-through: every subsystem error maps onto one
//! `ErrorKind` with a stable code and HTTP status, and keeps its message.

use std::fmt;

use crate::executor::ExecutorError;
use crate::ingest::IngestError;
use crate::planner::{PlannerError, PlannerErrorCode};
use crate::schema::SchemaError;
use crate::storage::{StorageError, StorageErrorCode};

/// Error categories exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Upload is not a recognized delimited file or cannot be decoded
    InvalidFormat,
    /// Header record has no fields
    EmptySchema,
    /// A data row's field count differs from the header's
    RowArityMismatch,
    /// No dataset exists for the owner
    DatasetNotFound,
    /// Filter key outside `col1..colN`
    UnknownFilterColumn,
    /// Filter parameter is not a flat JSON object
    InvalidFilter,
    /// Page number below 1
    InvalidPage,
    /// Disk failure or corrupted data
    StorageFailure,
    /// Owner string cannot name a dataset
    InvalidDatasetName,
    /// Identity already registered
    DuplicateIdentity,
}

impl ErrorKind {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidFormat => "INVALID_FORMAT",
            ErrorKind::EmptySchema => "EMPTY_SCHEMA",
            ErrorKind::RowArityMismatch => "ROW_ARITY_MISMATCH",
            ErrorKind::DatasetNotFound => "DATASET_NOT_FOUND",
            ErrorKind::UnknownFilterColumn => "UNKNOWN_FILTER_COLUMN",
            ErrorKind::InvalidFilter => "INVALID_FILTER",
            ErrorKind::InvalidPage => "INVALID_PAGE",
            ErrorKind::StorageFailure => "STORAGE_FAILURE",
            ErrorKind::InvalidDatasetName => "INVALID_DATASET_NAME",
            ErrorKind::DuplicateIdentity => "DUPLICATE_IDENTITY",
        }
    }

    /// HTTP status the kind is reported with
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorKind::InvalidFormat
            | ErrorKind::EmptySchema
            | ErrorKind::UnknownFilterColumn
            | ErrorKind::InvalidFilter
            | ErrorKind::InvalidPage
            | ErrorKind::InvalidDatasetName => 400,
            ErrorKind::DatasetNotFound => 404,
            ErrorKind::DuplicateIdentity => 409,
            ErrorKind::RowArityMismatch => 422,
            ErrorKind::StorageFailure => 500,
        }
    }

    /// Returns true if the caller caused the error
    pub fn is_client_error(&self) -> bool {
        self.http_status() < 500
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// API error with preserved subsystem message
#[derive(Debug, Clone)]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
}

impl ApiError {
    /// Create an error of `kind`
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create an invalid format error
    pub fn invalid_format(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidFormat, reason)
    }

    /// Create a storage failure error
    pub fn storage_failure(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::StorageFailure, reason)
    }

    /// Returns the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the string code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Returns the HTTP status
    pub fn http_status(&self) -> u16 {
        self.kind.http_status()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.code(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<SchemaError> for ApiError {
    fn from(err: SchemaError) -> Self {
        let kind = match err {
            SchemaError::EmptySchema => ErrorKind::EmptySchema,
            SchemaError::MalformedHeader(_) => ErrorKind::InvalidFormat,
        };
        Self::new(kind, err.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err.code() {
            StorageErrorCode::DatasetNotFound => {
                Self::new(ErrorKind::DatasetNotFound, err.message())
            }
            StorageErrorCode::RowArityMismatch => {
                Self::new(ErrorKind::RowArityMismatch, err.message())
            }
            StorageErrorCode::InvalidDatasetName => {
                Self::new(ErrorKind::InvalidDatasetName, err.message())
            }
            // Keep the storage code and details for operators
            _ => Self::new(ErrorKind::StorageFailure, err.to_string()),
        }
    }
}

impl From<PlannerError> for ApiError {
    fn from(err: PlannerError) -> Self {
        let kind = match err.code() {
            PlannerErrorCode::UnknownFilterColumn => ErrorKind::UnknownFilterColumn,
            PlannerErrorCode::InvalidPage => ErrorKind::InvalidPage,
            PlannerErrorCode::InvalidFilter => ErrorKind::InvalidFilter,
        };
        Self::new(kind, err.message())
    }
}

impl From<ExecutorError> for ApiError {
    fn from(err: ExecutorError) -> Self {
        match err {
            ExecutorError::Planner(e) => e.into(),
            ExecutorError::Storage(e) => e.into(),
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::InvalidFormat(reason) => Self::invalid_format(reason),
            IngestError::Schema(e) => e.into(),
            IngestError::Storage(e) => e.into(),
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
