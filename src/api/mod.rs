//! API layer
//!
//! Orchestrates ingestion, queries and export behind `DatasetService`.
//!
//! # Design Principles
//!
//! - One dataset per owner identifier
//! - Subsystem errors pass through with stable codes
//! - Counts, pages and exports share one predicate semantics
//!
//! # Supported Operations
//!
//! - ingest
//! - total_count / filtered_count
//! - page / filtered_page
//! - export_filtered
//! - schema

mod errors;
mod handler;
mod response;

pub use errors::{ApiError, ApiResult, ErrorKind};
pub use handler::DatasetService;
pub use response::{CountResponse, ErrorResponse, IngestSummary, PageResponse};
