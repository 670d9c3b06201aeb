//! API response types

use serde::{Deserialize, Serialize};

use super::errors::ApiError;
use crate::executor::PageResult;
use crate::storage::StoredRow;

pub use crate::ingest::IngestSummary;

/// Row count of a dataset or filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    pub total_records: u64,
}

/// One page of rows and the total for the same filter
#[derive(Debug, Clone, Serialize)]
pub struct PageResponse {
    pub total_records: u64,
    pub data: Vec<StoredRow>,
}

impl From<PageResult> for PageResponse {
    fn from(result: PageResult) -> Self {
        Self {
            total_records: result.total_records,
            data: result.data,
        }
    }
}

/// Error body returned by the HTTP surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    /// Create from an API error
    pub fn from_error(err: &ApiError) -> Self {
        Self {
            error: err.message().to_string(),
            code: err.code().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ErrorKind;

    #[test]
    fn test_error_response_shape() {
        let err = ApiError::new(ErrorKind::InvalidPage, "Page must be a positive integer, got 0");
        let json = serde_json::to_value(ErrorResponse::from_error(&err)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "error": "Page must be a positive integer, got 0",
                "code": "INVALID_PAGE"
            })
        );
    }

    #[test]
    fn test_count_response_shape() {
        let json = serde_json::to_value(CountResponse { total_records: 3 }).unwrap();
        assert_eq!(json, serde_json::json!({"total_records": 3}));
    }
}
