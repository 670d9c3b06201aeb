//! Result types for query execution

use serde::Serialize;

use crate::storage::StoredRow;

/// One page of matching rows plus the total match count.
///
/// Both values come from a single pass over one generation, so
/// `total_records` always agrees with the rows that were paged.
#[derive(Debug, Clone, Serialize)]
pub struct PageResult {
    /// Rows matching the predicate in the whole dataset
    pub total_records: u64,
    /// Rows on the requested page, in storage order
    pub data: Vec<StoredRow>,
}

impl PageResult {
    /// Returns true if the page holds no rows
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of rows on the page
    pub fn len(&self) -> usize {
        self.data.len()
    }
}
