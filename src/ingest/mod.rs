//! Ingestion subsystem
//!
//! Parses an uploaded delimited file and replaces the owner's dataset with
//! its contents as one atomic generation.

mod errors;
mod pipeline;

pub use errors::{IngestError, IngestResult};
pub use pipeline::{IngestPipeline, IngestStage, IngestSummary};
