//! # HTTP Server Module
//!
//! axum server exposing `DatasetService`.
//!
//! # Endpoints
//!
//! - `POST /upload-csv/:owner` - Replace the owner's dataset (multipart `file`)
//! - `GET /total-records/:owner` - Row count
//! - `GET /table-data/:owner?page=` - Unfiltered page
//! - `GET /filtered-data/:owner?filters=&page=` - Filtered page
//! - `GET /total-filter-records/:owner?filters=` - Filtered count
//! - `GET /download-filtered-file/:owner?filters=` - Streamed export
//! - `GET /schema/:owner` - Column layout and source headers
//! - `GET /health` - Health check

pub mod config;
pub mod dataset_routes;
pub mod errors;
pub mod health_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use errors::ServerError;
pub use server::HttpServer;
