//! Query executor
//!
//! Executes reads against one generation of a dataset.
//!
//! Execution flow (strict order):
//! 1. Open a cursor on the current generation
//! 2. Plan the filter against that generation's schema
//! 3. Scan once, counting every match and keeping the requested window
//!
//! Planning and scanning share the cursor, so a concurrent replace can
//! never pair one generation's schema with another's rows.

use tracing::debug;

use super::errors::ExecutorResult;
use super::result::PageResult;
use crate::planner::{Conjunction, FilterMap, Page, QueryPlan, QueryPlanner};
use crate::storage::{DatasetStore, RowCursor};

/// Query executor bound to a store
pub struct QueryExecutor<'a> {
    store: &'a DatasetStore,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new executor
    pub fn new(store: &'a DatasetStore) -> Self {
        Self { store }
    }

    /// Counts rows of `dataset` matching `filter`.
    pub fn count(&self, dataset: &str, filter: &FilterMap) -> ExecutorResult<u64> {
        let (cursor, predicate) = self.plan_unpaged(dataset, filter)?;
        let mut total = 0u64;
        for row in cursor.with_predicate(&predicate) {
            row?;
            total += 1;
        }
        debug!(dataset, total, "count executed");
        Ok(total)
    }

    /// Returns one page of rows matching `filter` together with the total.
    pub fn page(&self, dataset: &str, filter: &FilterMap, page: Page) -> ExecutorResult<PageResult> {
        let cursor = self.store.open_scan(dataset, &Conjunction::always())?;
        let plan = QueryPlanner::new(cursor.schema()).plan(filter, page)?;
        let result = Self::execute(cursor, &plan)?;

        debug!(
            dataset,
            page = page.number(),
            total = result.total_records,
            returned = result.len(),
            "page executed"
        );
        Ok(result)
    }

    /// Plans `filter` and returns a cursor over the matching rows.
    ///
    /// Used by export to stream the same rows a count would report.
    pub fn matching_rows(&self, dataset: &str, filter: &FilterMap) -> ExecutorResult<RowCursor> {
        let (cursor, predicate) = self.plan_unpaged(dataset, filter)?;
        Ok(cursor.with_predicate(&predicate))
    }

    fn plan_unpaged(
        &self,
        dataset: &str,
        filter: &FilterMap,
    ) -> ExecutorResult<(RowCursor, Conjunction)> {
        let cursor = self.store.open_scan(dataset, &Conjunction::always())?;
        let predicate = QueryPlanner::new(cursor.schema()).plan_unpaged(filter)?;
        Ok((cursor, predicate))
    }

    /// Executes a plan over `cursor`.
    ///
    /// This method is deterministic: same plan + same generation = same result.
    pub fn execute(cursor: RowCursor, plan: &QueryPlan) -> ExecutorResult<PageResult> {
        let window_end = plan.offset.saturating_add(plan.limit);
        let mut total_records = 0u64;
        let mut data = Vec::new();

        for row in cursor.with_predicate(&plan.predicate) {
            let row = row?;
            if total_records >= plan.offset && total_records < window_end {
                data.push(row);
            }
            total_records += 1;
        }

        Ok(PageResult {
            total_records,
            data,
        })
    }
}
