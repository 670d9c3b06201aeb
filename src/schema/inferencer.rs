//! Header-driven schema inference
//!
//! The header record only contributes its field count. Each field becomes a
//! positional column (`col1`, `col2`, ...) so that untrusted header text can
//! never reach an identifier position.

use std::io::Read;

use super::errors::{SchemaError, SchemaResult};
use super::types::{DatasetSchema, TabularFormat};

/// Infers dataset schemas from header records
pub struct SchemaInferencer;

impl SchemaInferencer {
    /// Infers a schema from an already-decoded header record.
    ///
    /// # Errors
    ///
    /// `EmptySchema` when the record has no fields, or a single empty field
    /// (which is how a blank first line decodes).
    pub fn infer<I, S>(header: I, format: TabularFormat) -> SchemaResult<DatasetSchema>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields: Vec<String> = header
            .into_iter()
            .map(|f| f.as_ref().trim().to_string())
            .collect();

        let blank = fields.is_empty() || (fields.len() == 1 && fields[0].is_empty());
        if blank {
            return Err(SchemaError::EmptySchema);
        }

        Ok(DatasetSchema::new(format, fields))
    }

    /// Reads the first record from `reader` and infers a schema from it.
    pub fn infer_from_reader<R: Read>(
        reader: &mut csv::Reader<R>,
        format: TabularFormat,
    ) -> SchemaResult<DatasetSchema> {
        let header = reader.headers()?.clone();
        Self::infer(header.iter(), format)
    }
}
