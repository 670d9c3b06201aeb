//! Planner error types
//!
//! Error codes:
//! - UNKNOWN_FILTER_COLUMN
//! - INVALID_PAGE
//! - INVALID_FILTER
//!
//! All planner errors reject the request; none touch stored data.

use std::fmt;

/// Planner-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerErrorCode {
    /// Filter key outside the dataset's column namespace
    UnknownFilterColumn,
    /// Page number below 1 or offset overflow
    InvalidPage,
    /// Filter map could not be decoded
    InvalidFilter,
}

impl PlannerErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            PlannerErrorCode::UnknownFilterColumn => "UNKNOWN_FILTER_COLUMN",
            PlannerErrorCode::InvalidPage => "INVALID_PAGE",
            PlannerErrorCode::InvalidFilter => "INVALID_FILTER",
        }
    }
}

impl fmt::Display for PlannerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Planner error type with full context
#[derive(Debug, Clone)]
pub struct PlannerError {
    /// Error code
    code: PlannerErrorCode,
    /// Human-readable message
    message: String,
    /// Filter key if applicable
    field: Option<String>,
}

impl PlannerError {
    /// Create an unknown filter column error
    pub fn unknown_filter_column(field: impl Into<String>, column_count: usize) -> Self {
        let f = field.into();
        Self {
            code: PlannerErrorCode::UnknownFilterColumn,
            message: format!(
                "Filter column '{}' is not one of col1..col{}",
                f, column_count
            ),
            field: Some(f),
        }
    }

    /// Create an invalid page error
    pub fn invalid_page(page: i64) -> Self {
        Self {
            code: PlannerErrorCode::InvalidPage,
            message: format!("Page must be a positive integer, got {}", page),
            field: None,
        }
    }

    /// Create an invalid filter error
    pub fn invalid_filter(reason: impl Into<String>) -> Self {
        Self {
            code: PlannerErrorCode::InvalidFilter,
            message: reason.into(),
            field: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> PlannerErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the filter key if applicable
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for PlannerError {}

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;
