//! Query planner
//!
//! Produces deterministic, validated query plans against one dataset schema.
//!
//! Planning order (strict):
//! 1. Drop filter entries with empty patterns
//! 2. Resolve every remaining key in the `col1..colN` namespace
//! 3. Build the conjunction, ordered by column position
//! 4. Validate the page and compute the offset

use super::ast::{Conjunction, FilterMap, Page, Predicate, PAGE_SIZE};
use super::errors::{PlannerError, PlannerResult};
use crate::schema::DatasetSchema;

/// Immutable query plan (no runtime state)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    /// Predicate shared by the count and the page read
    pub predicate: Conjunction,
    /// Matches to skip
    pub offset: u64,
    /// Maximum rows to return
    pub limit: u64,
}

/// Query planner bound to a dataset schema
pub struct QueryPlanner<'a> {
    schema: &'a DatasetSchema,
}

impl<'a> QueryPlanner<'a> {
    /// Creates a new planner
    pub fn new(schema: &'a DatasetSchema) -> Self {
        Self { schema }
    }

    /// Plans a paginated read.
    ///
    /// This method is deterministic: same inputs → same plan.
    pub fn plan(&self, filter: &FilterMap, page: Page) -> PlannerResult<QueryPlan> {
        let predicate = self.plan_unpaged(filter)?;
        let offset = page.offset()?;

        Ok(QueryPlan {
            predicate,
            offset,
            limit: PAGE_SIZE,
        })
    }

    /// Builds the predicate alone, for counts and export.
    pub fn plan_unpaged(&self, filter: &FilterMap) -> PlannerResult<Conjunction> {
        let mut predicates = Vec::new();

        for (key, pattern) in filter.active_entries() {
            let column = self.schema.resolve(key).ok_or_else(|| {
                PlannerError::unknown_filter_column(key, self.schema.column_count())
            })?;
            predicates.push(Predicate::contains(column, pattern));
        }

        Ok(Conjunction::of(predicates))
    }
}
