//! Dataset storage subsystem
//!
//! Each dataset is one unit file of checksummed records: a schema record
//! followed by the rows in ingestion order.
//!
//! # Design Principles
//!
//! - Whole-generation writes, published by atomic rename
//! - Checksum-verified on every read
//! - Readers never block and never see a partial generation
//! - Corruption fails the read loudly

mod checksum;
mod errors;
mod reader;
mod record;
mod store;
mod writer;

pub use checksum::compute_checksum;
pub use errors::{StorageError, StorageErrorCode, StorageResult};
pub use reader::UnitReader;
pub use record::{StoredRow, UnitRecord};
pub use store::{is_valid_dataset_name, DatasetStore, Generation, RowCursor, STAGING_GRACE};
pub use writer::UnitWriter;
