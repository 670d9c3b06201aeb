//! Unit reader with strict corruption detection
//!
//! - The schema record is read and validated on open
//! - Every row record is checksum-verified before it is returned
//! - Row arity is re-checked against the schema on every read
//!
//! The reader captures the file size at open time. Units are only ever
//! replaced by rename, so an open handle always sees one complete generation.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::errors::{StorageError, StorageResult};
use super::record::{UnitRecord, MIN_RECORD_SIZE};
use crate::schema::DatasetSchema;

/// Sequential reader over one unit file.
pub struct UnitReader {
    /// Buffered reader
    reader: BufReader<File>,
    /// Schema decoded from the first record
    schema: DatasetSchema,
    /// Current byte offset
    current_offset: u64,
    /// Total file size
    file_size: u64,
}

impl UnitReader {
    /// Opens a unit file and decodes its schema record.
    ///
    /// A missing file is reported as `io::ErrorKind::NotFound` inside a
    /// `STORAGE_READ_FAILED` error; the store maps it to `DATASET_NOT_FOUND`.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = File::open(path).map_err(|e| {
            StorageError::read_failed(format!("Failed to open unit file: {}", path.display()), e)
        })?;

        let file_size = file
            .metadata()
            .map_err(|e| StorageError::read_failed("Failed to read file metadata", e))?
            .len();

        let mut reader = BufReader::new(file);
        let (first, consumed) = Self::read_record(&mut reader, 0, file_size)?.ok_or_else(|| {
            StorageError::corruption_at_offset(0, "Unit file has no schema record")
        })?;

        let schema = match first {
            UnitRecord::Schema(schema) => schema,
            UnitRecord::Row(_) => {
                return Err(StorageError::corruption_at_offset(
                    0,
                    "Unit file does not start with a schema record",
                ))
            }
        };

        Ok(Self {
            reader,
            schema,
            current_offset: consumed,
            file_size,
        })
    }

    /// Returns the unit's schema.
    pub fn schema(&self) -> &DatasetSchema {
        &self.schema
    }

    /// Reads the next row.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(values))` if a row was read
    /// - `Ok(None)` at end of file
    /// - `Err(DATA_CORRUPTION)` on checksum, framing or arity failure
    pub fn read_row(&mut self) -> StorageResult<Option<Vec<String>>> {
        let offset = self.current_offset;
        let (record, consumed) =
            match Self::read_record(&mut self.reader, offset, self.file_size)? {
                Some(r) => r,
                None => return Ok(None),
            };
        self.current_offset += consumed;

        match record {
            UnitRecord::Row(values) if values.len() == self.schema.column_count() => {
                Ok(Some(values))
            }
            UnitRecord::Row(values) => Err(StorageError::corruption_at_offset(
                offset,
                format!(
                    "Row has {} fields, schema has {}",
                    values.len(),
                    self.schema.column_count()
                ),
            )),
            UnitRecord::Schema(_) => Err(StorageError::corruption_at_offset(
                offset,
                "Unexpected schema record after unit header",
            )),
        }
    }

    fn read_record(
        reader: &mut BufReader<File>,
        offset: u64,
        file_size: u64,
    ) -> StorageResult<Option<(UnitRecord, u64)>> {
        if offset >= file_size {
            return Ok(None);
        }

        let remaining = file_size - offset;
        if remaining < MIN_RECORD_SIZE as u64 {
            return Err(StorageError::corruption_at_offset(
                offset,
                format!(
                    "Truncated unit: {} bytes remaining, minimum record size is {}",
                    remaining, MIN_RECORD_SIZE
                ),
            ));
        }

        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf).map_err(|e| {
            StorageError::corruption_at_offset(offset, format!("Failed to read record length: {}", e))
        })?;
        let record_length = u32::from_le_bytes(len_buf) as u64;

        if record_length < MIN_RECORD_SIZE as u64 {
            return Err(StorageError::corruption_at_offset(
                offset,
                format!("Invalid record length: {}", record_length),
            ));
        }

        if record_length > remaining {
            return Err(StorageError::corruption_at_offset(
                offset,
                format!(
                    "Record length {} exceeds remaining file size {}",
                    record_length, remaining
                ),
            ));
        }

        let mut record_buf = vec![0u8; record_length as usize];
        record_buf[0..4].copy_from_slice(&len_buf);
        reader.read_exact(&mut record_buf[4..]).map_err(|e| {
            StorageError::corruption_at_offset(offset, format!("Failed to read record body: {}", e))
        })?;

        let (record, consumed) = UnitRecord::deserialize(&record_buf)
            .map_err(|e| StorageError::corruption_at_offset(offset, e.to_string()))?;

        Ok(Some((record, consumed as u64)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaInferencer, TabularFormat};
    use crate::storage::{StorageErrorCode, UnitWriter};
    use std::fs;
    use tempfile::TempDir;

    fn write_unit(path: &Path, rows: &[[&str; 2]]) {
        let schema = SchemaInferencer::infer(["a", "b"], TabularFormat::Tsv).unwrap();
        let mut writer = UnitWriter::create(path, &schema).unwrap();
        for row in rows {
            writer.append(row.iter().map(|s| s.to_string()).collect()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_schema_decoded_on_open() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("u.grid");
        write_unit(&path, &[]);

        let mut reader = UnitReader::open(&path).unwrap();
        assert_eq!(reader.schema().column_count(), 2);
        assert_eq!(reader.schema().format(), TabularFormat::Tsv);
        assert!(reader.read_row().unwrap().is_none());
    }

    #[test]
    fn test_rows_in_storage_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("u.grid");
        write_unit(&path, &[["1", "2"], ["3", "4"], ["5", "6"]]);

        let mut reader = UnitReader::open(&path).unwrap();
        let mut rows = Vec::new();
        while let Some(row) = reader.read_row().unwrap() {
            rows.push(row);
        }
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], vec!["5", "6"]);
    }

    #[test]
    fn test_truncated_tail_is_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("u.grid");
        write_unit(&path, &[["1", "2"], ["3", "4"]]);

        let contents = fs::read(&path).unwrap();
        fs::write(&path, &contents[..contents.len() - 3]).unwrap();

        let mut reader = UnitReader::open(&path).unwrap();
        assert!(reader.read_row().unwrap().is_some());
        let err = reader.read_row().unwrap_err();
        assert_eq!(err.code(), StorageErrorCode::DataCorruption);
    }

    #[test]
    fn test_empty_file_is_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("u.grid");
        fs::write(&path, b"").unwrap();

        let err = UnitReader::open(&path).err().unwrap();
        assert_eq!(err.code(), StorageErrorCode::DataCorruption);
    }
}
