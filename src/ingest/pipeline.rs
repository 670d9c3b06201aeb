//! Ingestion pipeline
//!
//! One upload runs through these stages in strict order:
//!
//! ```text
//! Received → HeaderParsed → SchemaCreated → RowsLoaded → Committed
//!     └──────────┴──────────────┴──────────────┴──→ Failed
//! ```
//!
//! Rows are streamed into a staged generation. Nothing becomes visible
//! until the commit; a failure at any stage drops the generation, which
//! removes its staging file and leaves the prior dataset intact.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::errors::{IngestError, IngestResult};
use crate::schema::{SchemaInferencer, TabularFormat};
use crate::storage::DatasetStore;

/// Stage of one ingestion run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    /// Upload accepted for processing
    Received,
    /// Header record decoded
    HeaderParsed,
    /// Staged generation created
    SchemaCreated,
    /// All rows staged
    RowsLoaded,
    /// Generation published
    Committed,
    /// Run aborted; nothing was published
    Failed,
}

impl IngestStage {
    /// Returns true for `Committed` and `Failed`
    pub fn is_terminal(&self) -> bool {
        matches!(self, IngestStage::Committed | IngestStage::Failed)
    }
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestStage::Received => "received",
            IngestStage::HeaderParsed => "header_parsed",
            IngestStage::SchemaCreated => "schema_created",
            IngestStage::RowsLoaded => "rows_loaded",
            IngestStage::Committed => "committed",
            IngestStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of a committed ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    /// Dataset (owner) name
    pub dataset: String,
    /// Number of positional columns
    pub columns: usize,
    /// Data rows stored
    pub rows_loaded: u64,
    /// Upload format
    pub format: TabularFormat,
    /// Commit time
    pub committed_at: DateTime<Utc>,
}

/// Tracks and logs stage transitions of one run
struct IngestRun<'a> {
    dataset: &'a str,
    stage: IngestStage,
}

impl<'a> IngestRun<'a> {
    fn start(dataset: &'a str, filename: &str, bytes: usize) -> Self {
        info!(
            dataset,
            filename,
            bytes,
            stage = %IngestStage::Received,
            "ingest started"
        );
        Self {
            dataset,
            stage: IngestStage::Received,
        }
    }

    fn advance(&mut self, next: IngestStage) {
        info!(dataset = self.dataset, from = %self.stage, stage = %next, "ingest stage");
        self.stage = next;
    }

    fn fail(&mut self, err: IngestError) -> IngestError {
        warn!(
            dataset = self.dataset,
            from = %self.stage,
            stage = %IngestStage::Failed,
            code = err.code(),
            error = %err,
            "ingest failed"
        );
        self.stage = IngestStage::Failed;
        err
    }
}

/// Turns uploaded delimited text into a committed dataset generation
#[derive(Clone)]
pub struct IngestPipeline {
    store: DatasetStore,
}

impl IngestPipeline {
    /// Creates a pipeline writing into `store`
    pub fn new(store: DatasetStore) -> Self {
        Self { store }
    }

    /// Ingests `bytes` as the new content of `dataset`.
    ///
    /// The format is taken from `filename`'s extension. On success the
    /// dataset holds exactly the uploaded rows; on error it is unchanged.
    pub fn run(&self, dataset: &str, filename: &str, bytes: &[u8]) -> IngestResult<IngestSummary> {
        let mut run = IngestRun::start(dataset, filename, bytes.len());
        self.execute(&mut run, dataset, filename, bytes)
            .map_err(|e| run.fail(e))
    }

    fn execute(
        &self,
        run: &mut IngestRun<'_>,
        dataset: &str,
        filename: &str,
        bytes: &[u8],
    ) -> IngestResult<IngestSummary> {
        let format = TabularFormat::from_filename(filename).ok_or_else(|| {
            IngestError::InvalidFormat(format!(
                "'{}' is not a .csv or .tsv file",
                filename
            ))
        })?;

        if bytes.is_empty() {
            return Err(IngestError::InvalidFormat("Uploaded file is empty".into()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(format.delimiter())
            .has_headers(true)
            // Arity is enforced by the store so the error names the row
            .flexible(true)
            .from_reader(bytes);

        let schema = SchemaInferencer::infer_from_reader(&mut reader, format)?;
        run.advance(IngestStage::HeaderParsed);

        let mut generation = self.store.begin_generation(dataset, &schema)?;
        run.advance(IngestStage::SchemaCreated);

        for record in reader.records() {
            let record = record.map_err(|e| {
                IngestError::InvalidFormat(format!(
                    "Malformed record after row {}: {}",
                    generation.rows_written(),
                    e
                ))
            })?;
            generation.append(record.iter().map(str::to_string).collect())?;
        }
        run.advance(IngestStage::RowsLoaded);

        let rows_loaded = generation.commit()?;
        run.advance(IngestStage::Committed);

        Ok(IngestSummary {
            dataset: dataset.to_string(),
            columns: schema.column_count(),
            rows_loaded,
            format,
            committed_at: Utc::now(),
        })
    }
}
