//! Schema Inferencer subsystem
//!
//! Turns the first record of an uploaded file into a positional column
//! layout. Header text is kept for display only.

mod errors;
mod inferencer;
mod types;

pub use errors::{SchemaError, SchemaResult};
pub use inferencer::SchemaInferencer;
pub use types::{ColumnId, DatasetSchema, TabularFormat};
