//! Dataset service
//!
//! The single entry point used by the HTTP server and the CLI. Each owner
//! identifier names one dataset; every operation is synchronous and safe to
//! call from many threads at once.

use tracing::debug;

use super::errors::ApiResult;
use super::response::{CountResponse, IngestSummary, PageResponse};
use crate::executor::QueryExecutor;
use crate::export::{ExportStream, ExportWriter};
use crate::ingest::IngestPipeline;
use crate::planner::{FilterMap, Page};
use crate::schema::DatasetSchema;
use crate::storage::DatasetStore;

/// Operations on owner datasets
#[derive(Clone)]
pub struct DatasetService {
    store: DatasetStore,
    pipeline: IngestPipeline,
}

impl DatasetService {
    /// Create a service over `store`
    pub fn new(store: DatasetStore) -> Self {
        let pipeline = IngestPipeline::new(store.clone());
        Self { store, pipeline }
    }

    /// Returns the underlying store
    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    /// Replaces the owner's dataset with an uploaded file.
    pub fn ingest(&self, owner: &str, filename: &str, bytes: &[u8]) -> ApiResult<IngestSummary> {
        Ok(self.pipeline.run(owner, filename, bytes)?)
    }

    /// Total rows in the owner's dataset.
    pub fn total_count(&self, owner: &str) -> ApiResult<CountResponse> {
        self.filtered_count(owner, &FilterMap::new())
    }

    /// One unfiltered page.
    pub fn page(&self, owner: &str, page: i64) -> ApiResult<PageResponse> {
        self.filtered_page(owner, &FilterMap::new(), page)
    }

    /// One page of rows matching `filter`, with the filtered total.
    pub fn filtered_page(
        &self,
        owner: &str,
        filter: &FilterMap,
        page: i64,
    ) -> ApiResult<PageResponse> {
        let page = Page::new(page)?;
        let result = QueryExecutor::new(&self.store).page(owner, filter, page)?;
        Ok(result.into())
    }

    /// Rows matching `filter`.
    pub fn filtered_count(&self, owner: &str, filter: &FilterMap) -> ApiResult<CountResponse> {
        let total_records = QueryExecutor::new(&self.store).count(owner, filter)?;
        Ok(CountResponse { total_records })
    }

    /// Streams every row matching `filter` as delimited text.
    pub fn export_filtered(&self, owner: &str, filter: &FilterMap) -> ApiResult<ExportStream> {
        ExportWriter::new(&self.store).export(owner, filter)
    }

    /// Schema of the owner's dataset.
    pub fn schema(&self, owner: &str) -> ApiResult<DatasetSchema> {
        Ok(self.store.schema(owner)?)
    }

    /// Removes the owner's dataset.
    pub fn drop_dataset(&self, owner: &str) -> ApiResult<()> {
        debug!(dataset = owner, "drop requested");
        Ok(self.store.drop_dataset(owner)?)
    }
}
