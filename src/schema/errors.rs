//! Schema inference errors

use thiserror::Error;

/// Result type for schema inference
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while reading a header record
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Header record missing or without any field
    #[error("Header record has no fields")]
    EmptySchema,

    /// Header record could not be decoded
    #[error("Malformed header record: {0}")]
    MalformedHeader(String),
}

impl SchemaError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::EmptySchema => "EMPTY_SCHEMA",
            SchemaError::MalformedHeader(_) => "INVALID_FORMAT",
        }
    }
}

impl From<csv::Error> for SchemaError {
    fn from(e: csv::Error) -> Self {
        SchemaError::MalformedHeader(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(SchemaError::EmptySchema.code(), "EMPTY_SCHEMA");
        assert_eq!(
            SchemaError::MalformedHeader("bad utf-8".into()).code(),
            "INVALID_FORMAT"
        );
    }
}
