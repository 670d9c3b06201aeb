//! Query Executor subsystem
//!
//! Consumes plans and produces deterministic results from one dataset
//! generation.
//!
//! # Execution Flow (strict order)
//!
//! 1. Open the current generation
//! 2. Plan against its schema
//! 3. Verify checksums on every row read
//! 4. Filter rows by the conjunction
//! 5. Count all matches and keep the requested window
//!
//! # Guarantees
//!
//! - Counts, pages and exports use the same predicate semantics
//! - Corruption fails the read loudly

mod errors;
mod executor;
mod filters;
mod result;

pub use errors::{ExecutorError, ExecutorResult};
pub use executor::QueryExecutor;
pub use filters::PredicateFilter;
pub use result::PageResult;
