//! gridstore - dynamic-schema tabular ingestion and query service
//!
//! Uploaded CSV/TSV files become per-owner datasets with positional columns
//! (`col1..colN`). Datasets support counting, case-insensitive substring
//! filtering, fixed-size pagination and streamed export.
//!
//! Layers, bottom-up:
//! - `schema`: header inference and column naming
//! - `storage`: checksummed dataset units with atomic replacement
//! - `planner`: filter validation and page arithmetic
//! - `executor`: single-pass count and page evaluation
//! - `ingest`: upload pipeline
//! - `export`: chunked delimited output
//! - `api`: service facade and error taxonomy
//! - `http_server`, `cli`: outer surfaces

pub mod api;
pub mod cli;
pub mod executor;
pub mod export;
pub mod http_server;
pub mod ingest;
pub mod observability;
pub mod planner;
pub mod schema;
pub mod storage;
