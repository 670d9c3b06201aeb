//! Export writer
//!
//! Streams the filtered rows of a dataset as delimited text:
//! - the header record (`col1..colN`) is always the first chunk
//! - rows follow in storage order, `EXPORT_CHUNK_ROWS` per chunk
//! - the dataset's own delimiter is used
//!
//! The stream is lazy. Memory use is bounded by one chunk regardless of
//! dataset size.

use tracing::{info, warn};

use crate::api::{ApiError, ApiResult};
use crate::executor::QueryExecutor;
use crate::planner::FilterMap;
use crate::schema::TabularFormat;
use crate::storage::{DatasetStore, RowCursor};

/// Rows encoded per chunk
pub const EXPORT_CHUNK_ROWS: usize = 1000;

/// Builds export streams over a store
pub struct ExportWriter<'a> {
    store: &'a DatasetStore,
}

impl<'a> ExportWriter<'a> {
    /// Creates a new export writer
    pub fn new(store: &'a DatasetStore) -> Self {
        Self { store }
    }

    /// Opens an export of the rows of `dataset` matching `filter`.
    ///
    /// Planning errors and a missing dataset surface here, before any
    /// bytes are produced.
    pub fn export(&self, dataset: &str, filter: &FilterMap) -> ApiResult<ExportStream> {
        let cursor = QueryExecutor::new(self.store).matching_rows(dataset, filter)?;
        let format = cursor.schema().format();
        let header = cursor.schema().column_names();

        info!(dataset, format = %format, "export started");

        Ok(ExportStream {
            dataset: dataset.to_string(),
            format,
            cursor,
            header: Some(header),
            rows_exported: 0,
            done: false,
        })
    }
}

/// Finite, non-restartable sequence of encoded chunks.
///
/// After an `Err` item the stream ends.
pub struct ExportStream {
    dataset: String,
    format: TabularFormat,
    cursor: RowCursor,
    header: Option<Vec<String>>,
    rows_exported: u64,
    done: bool,
}

impl ExportStream {
    /// Format of the encoded output
    pub fn format(&self) -> TabularFormat {
        self.format
    }

    /// Suggested download file name
    pub fn file_name(&self) -> String {
        format!("{}_filtered.{}", self.dataset, self.format.extension())
    }

    /// Rows emitted so far
    pub fn rows_exported(&self) -> u64 {
        self.rows_exported
    }

    fn encoder(&self) -> csv::Writer<Vec<u8>> {
        csv::WriterBuilder::new()
            .delimiter(self.format.delimiter())
            .from_writer(Vec::new())
    }

    fn finish_chunk(writer: csv::Writer<Vec<u8>>) -> ApiResult<Vec<u8>> {
        writer
            .into_inner()
            .map_err(|e| ApiError::storage_failure(format!("Failed to encode export: {}", e)))
    }

    fn encode_header(&self, header: &[String]) -> ApiResult<Vec<u8>> {
        let mut writer = self.encoder();
        writer
            .write_record(header)
            .map_err(|e| ApiError::storage_failure(format!("Failed to encode header: {}", e)))?;
        Self::finish_chunk(writer)
    }

    fn next_chunk(&mut self) -> Option<ApiResult<Vec<u8>>> {
        let mut writer = self.encoder();
        let mut rows = 0usize;

        while rows < EXPORT_CHUNK_ROWS {
            match self.cursor.next() {
                Some(Ok(row)) => {
                    if let Err(e) = writer.write_record(&row.values) {
                        return Some(Err(ApiError::storage_failure(format!(
                            "Failed to encode row {}: {}",
                            row.id, e
                        ))));
                    }
                    rows += 1;
                }
                Some(Err(e)) => return Some(Err(e.into())),
                None => break,
            }
        }

        if rows == 0 {
            return None;
        }
        self.rows_exported += rows as u64;
        Some(Self::finish_chunk(writer))
    }
}

impl Iterator for ExportStream {
    type Item = ApiResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if let Some(header) = self.header.take() {
            let chunk = self.encode_header(&header);
            self.done = chunk.is_err();
            return Some(chunk);
        }

        match self.next_chunk() {
            Some(Ok(chunk)) => Some(Ok(chunk)),
            Some(Err(e)) => {
                self.done = true;
                warn!(
                    dataset = %self.dataset,
                    rows = self.rows_exported,
                    error = %e,
                    "export aborted"
                );
                Some(Err(e))
            }
            None => {
                self.done = true;
                info!(dataset = %self.dataset, rows = self.rows_exported, "export finished");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ErrorKind;
    use crate::ingest::IngestPipeline;
    use tempfile::TempDir;

    fn collect(stream: ExportStream) -> Vec<Vec<u8>> {
        stream.collect::<ApiResult<Vec<_>>>().unwrap()
    }

    #[test]
    fn test_header_then_rows() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::open(temp_dir.path()).unwrap();
        IngestPipeline::new(store.clone())
            .run("alice", "p.csv", b"name,city\nbob,\"Paris, FR\"\namy,rome\n")
            .unwrap();

        let stream = ExportWriter::new(&store)
            .export("alice", &FilterMap::new())
            .unwrap();
        assert_eq!(stream.file_name(), "alice_filtered.csv");
        let chunks = collect(stream);
        assert_eq!(chunks.len(), 2);

        let body = String::from_utf8(chunks.concat()).unwrap();
        assert_eq!(body, "col1,col2\nbob,\"Paris, FR\"\namy,rome\n");
    }

    #[test]
    fn test_tsv_round_trip_delimiter() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::open(temp_dir.path()).unwrap();
        IngestPipeline::new(store.clone())
            .run("alice", "p.tsv", b"a\tb\nx,y\tz\n")
            .unwrap();

        let stream = ExportWriter::new(&store)
            .export("alice", &FilterMap::new())
            .unwrap();
        assert_eq!(stream.format(), TabularFormat::Tsv);
        let body = String::from_utf8(collect(stream).concat()).unwrap();
        assert_eq!(body, "col1\tcol2\nx,y\tz\n");
    }

    #[test]
    fn test_empty_match_is_header_only() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::open(temp_dir.path()).unwrap();
        IngestPipeline::new(store.clone())
            .run("alice", "p.csv", b"a,b\n1,2\n")
            .unwrap();

        let stream = ExportWriter::new(&store)
            .export("alice", &FilterMap::new().with("col1", "zzz"))
            .unwrap();
        let body = String::from_utf8(collect(stream).concat()).unwrap();
        assert_eq!(body, "col1,col2\n");
    }

    #[test]
    fn test_large_export_is_chunked() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::open(temp_dir.path()).unwrap();
        let mut upload = String::from("n\n");
        for i in 0..2500 {
            upload.push_str(&format!("{}\n", i));
        }
        IngestPipeline::new(store.clone())
            .run("alice", "n.csv", upload.as_bytes())
            .unwrap();

        let stream = ExportWriter::new(&store)
            .export("alice", &FilterMap::new())
            .unwrap();
        let chunks = collect(stream);
        // header + 1000 + 1000 + 500
        assert_eq!(chunks.len(), 4);
        let body = String::from_utf8(chunks.concat()).unwrap();
        assert_eq!(body.lines().count(), 2501);
        assert_eq!(body.lines().filter(|l| *l == "col1").count(), 1);
    }

    #[test]
    fn test_errors_surface_before_streaming() {
        let temp_dir = TempDir::new().unwrap();
        let store = DatasetStore::open(temp_dir.path()).unwrap();

        let err = ExportWriter::new(&store)
            .export("ghost", &FilterMap::new())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::DatasetNotFound);
    }
}
