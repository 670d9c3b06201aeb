//! Export subsystem
//!
//! Encodes filtered dataset rows back into the dataset's delimited format.

mod writer;

pub use writer::{ExportStream, ExportWriter, EXPORT_CHUNK_ROWS};
