//! Unit writer for staged dataset generations
//!
//! A unit is always written to a private staging path first:
//! - the schema record is written on creation
//! - rows are appended through a buffered writer
//! - `finish` flushes and fsyncs once, before the caller renames the file
//!   into place
//!
//! Nothing here is visible to readers until the rename.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::errors::{StorageError, StorageResult};
use super::record::UnitRecord;
use crate::schema::DatasetSchema;

/// Append-only writer for one staging unit file.
pub struct UnitWriter {
    /// Path of the unit file
    path: PathBuf,
    /// Buffered file handle
    writer: BufWriter<File>,
    /// Column count every row must match
    column_count: usize,
    /// Rows appended so far
    rows_written: u64,
    /// Bytes written so far
    current_offset: u64,
}

impl UnitWriter {
    /// Creates a new unit file at `path` and writes its schema record.
    ///
    /// # Errors
    ///
    /// Returns `STORAGE_WRITE_FAILED` if the file already exists or cannot
    /// be created.
    pub fn create(path: &Path, schema: &DatasetSchema) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| {
                StorageError::write_failed(
                    format!("Failed to create unit file: {}", path.display()),
                    e,
                )
            })?;

        let mut writer = Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            column_count: schema.column_count(),
            rows_written: 0,
            current_offset: 0,
        };
        writer.write_record(&UnitRecord::Schema(schema.clone()))?;

        Ok(writer)
    }

    /// Returns the number of rows appended.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Appends one row.
    ///
    /// # Errors
    ///
    /// `ROW_ARITY_MISMATCH` if the row length differs from the column count;
    /// nothing is written in that case.
    pub fn append(&mut self, values: Vec<String>) -> StorageResult<()> {
        if values.len() != self.column_count {
            return Err(StorageError::row_arity_mismatch(
                self.rows_written + 1,
                self.column_count,
                values.len(),
            ));
        }

        self.write_record(&UnitRecord::Row(values))?;
        self.rows_written += 1;
        Ok(())
    }

    /// Flushes buffered records and fsyncs the file.
    ///
    /// Returns the number of rows in the unit.
    pub fn finish(mut self) -> StorageResult<u64> {
        self.writer.flush().map_err(|e| {
            StorageError::write_failed(format!("Failed to flush unit: {}", self.path.display()), e)
        })?;

        // fsync - the rename that follows must never expose unsynced data
        self.writer.get_ref().sync_all().map_err(|e| {
            StorageError::write_failed(format!("fsync failed for unit: {}", self.path.display()), e)
        })?;

        Ok(self.rows_written)
    }

    fn write_record(&mut self, record: &UnitRecord) -> StorageResult<()> {
        let serialized = record.serialize();
        self.writer.write_all(&serialized).map_err(|e| {
            StorageError::write_failed(
                format!("Failed to write record at offset {}", self.current_offset),
                e,
            )
        })?;
        self.current_offset += serialized.len() as u64;
        Ok(())
    }
}
