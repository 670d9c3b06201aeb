//! Storage unit record types
//!
//! Every dataset unit is a sequence of records in this format:
//!
//! ```text
//! +------------------+
//! | Record Length    | (u32 LE, includes itself and the checksum)
//! +------------------+
//! | Record Kind      | (u8: 0 = schema, 1 = row)
//! +------------------+
//! | Field Count      | (u32 LE)
//! +------------------+
//! | Fields           | (each: u32 LE length + UTF-8 bytes)
//! +------------------+
//! | Checksum         | (u32 LE)
//! +------------------+
//! ```
//!
//! The first record of a unit is always the schema record: the format name,
//! the N positional column ids, then the N source header strings. Every
//! following record is a row of exactly N fields.
//!
//! Checksum covers all bytes except the checksum itself.

use std::io::{self, Read};

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::checksum::compute_checksum;
use crate::schema::{ColumnId, DatasetSchema, TabularFormat};

/// Smallest valid record: length + kind + field count + checksum
pub(crate) const MIN_RECORD_SIZE: usize = 4 + 1 + 4 + 4;

const KIND_SCHEMA: u8 = 0;
const KIND_ROW: u8 = 1;

/// A decoded unit record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitRecord {
    /// Column layout header
    Schema(DatasetSchema),
    /// One data row
    Row(Vec<String>),
}

impl UnitRecord {
    fn kind(&self) -> u8 {
        match self {
            UnitRecord::Schema(_) => KIND_SCHEMA,
            UnitRecord::Row(_) => KIND_ROW,
        }
    }

    /// Serialize the complete record to bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let mut body = Vec::new();
        body.push(self.kind());

        match self {
            UnitRecord::Schema(schema) => {
                let names = schema.column_names();
                let field_count = 1 + names.len() + schema.source_headers().len();
                body.extend_from_slice(&(field_count as u32).to_le_bytes());
                write_field(&mut body, schema.format().extension());
                for name in &names {
                    write_field(&mut body, name);
                }
                for header in schema.source_headers() {
                    write_field(&mut body, header);
                }
            }
            UnitRecord::Row(values) => {
                body.extend_from_slice(&(values.len() as u32).to_le_bytes());
                for value in values {
                    write_field(&mut body, value);
                }
            }
        }

        // Record length = 4 (length) + body.len() + 4 (checksum)
        let record_length = (4 + body.len() + 4) as u32;

        let mut record = Vec::with_capacity(record_length as usize);
        record.extend_from_slice(&record_length.to_le_bytes());
        record.extend_from_slice(&body);
        let checksum = compute_checksum(&record);
        record.extend_from_slice(&checksum.to_le_bytes());

        record
    }

    /// Deserialize a record from bytes, verifying checksum.
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn deserialize(data: &[u8]) -> io::Result<(Self, usize)> {
        if data.len() < MIN_RECORD_SIZE {
            return Err(invalid(io::ErrorKind::UnexpectedEof, "Record too short"));
        }

        let record_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;

        if record_length < MIN_RECORD_SIZE {
            return Err(invalid(
                io::ErrorKind::InvalidData,
                format!("Invalid record length: {}", record_length),
            ));
        }

        if data.len() < record_length {
            return Err(invalid(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "Record truncated: expected {} bytes, got {}",
                    record_length,
                    data.len()
                ),
            ));
        }

        let checksum_offset = record_length - 4;
        let stored_checksum = u32::from_le_bytes([
            data[checksum_offset],
            data[checksum_offset + 1],
            data[checksum_offset + 2],
            data[checksum_offset + 3],
        ]);
        let computed_checksum = compute_checksum(&data[0..checksum_offset]);

        if computed_checksum != stored_checksum {
            return Err(invalid(
                io::ErrorKind::InvalidData,
                format!(
                    "Checksum mismatch: computed {:08x}, stored {:08x}",
                    computed_checksum, stored_checksum
                ),
            ));
        }

        let mut cursor = io::Cursor::new(&data[4..checksum_offset]);

        let mut kind = [0u8; 1];
        cursor.read_exact(&mut kind)?;
        let field_count = read_u32(&mut cursor)? as usize;

        let mut fields = Vec::with_capacity(field_count.min(4096));
        for _ in 0..field_count {
            fields.push(read_string(&mut cursor)?);
        }

        if cursor.position() as usize != checksum_offset - 4 {
            return Err(invalid(io::ErrorKind::InvalidData, "Trailing bytes in record body"));
        }

        let record = match kind[0] {
            KIND_SCHEMA => UnitRecord::Schema(decode_schema(fields)?),
            KIND_ROW => UnitRecord::Row(fields),
            other => {
                return Err(invalid(
                    io::ErrorKind::InvalidData,
                    format!("Unknown record kind: {}", other),
                ))
            }
        };

        Ok((record, record_length))
    }
}

fn decode_schema(mut fields: Vec<String>) -> io::Result<DatasetSchema> {
    if fields.is_empty() || fields.len() % 2 == 0 {
        return Err(invalid(io::ErrorKind::InvalidData, "Malformed schema record"));
    }

    let format: TabularFormat = fields[0].parse().map_err(|_| {
        invalid(
            io::ErrorKind::InvalidData,
            format!("Unknown tabular format: {}", fields[0]),
        )
    })?;

    let column_count = (fields.len() - 1) / 2;
    let headers = fields.split_off(1 + column_count);

    for (index, name) in fields[1..].iter().enumerate() {
        if ColumnId::parse(name) != Some(ColumnId::from_index(index)) {
            return Err(invalid(
                io::ErrorKind::InvalidData,
                format!("Schema column {} is '{}', expected col{}", index + 1, name, index + 1),
            ));
        }
    }

    if column_count == 0 {
        return Err(invalid(io::ErrorKind::InvalidData, "Schema record has no columns"));
    }

    Ok(DatasetSchema::new(format, headers))
}

fn write_field(buf: &mut Vec<u8>, field: &str) {
    buf.extend_from_slice(&(field.len() as u32).to_le_bytes());
    buf.extend_from_slice(field.as_bytes());
}

fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_string<R: Read>(reader: &mut R) -> io::Result<String> {
    let len = read_u32(reader)? as usize;
    let mut buf = Vec::new();
    reader.by_ref().take(len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(invalid(io::ErrorKind::UnexpectedEof, "Field truncated"));
    }
    String::from_utf8(buf)
        .map_err(|e| invalid(io::ErrorKind::InvalidData, format!("Invalid UTF-8: {}", e)))
}

fn invalid(kind: io::ErrorKind, message: impl Into<String>) -> io::Error {
    io::Error::new(kind, message.into())
}

/// A row as returned to readers.
///
/// `id` is the row's 1-based position in storage order. Serializes as
/// `{"id": 1, "col1": "...", ...}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRow {
    /// 1-based storage position
    pub id: u64,
    /// Field values, one per column
    pub values: Vec<String>,
}

impl Serialize for StoredRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry("id", &self.id)?;
        for (index, value) in self.values.iter().enumerate() {
            map.serialize_entry(&ColumnId::from_index(index).to_string(), value)?;
        }
        map.end()
    }
}
