//! Query Planner subsystem
//!
//! Translates a filter map and a page request into a validated plan.
//!
//! # Design Principles
//!
//! - Deterministic: same inputs → same plan
//! - Closed namespace: filter keys must resolve to `col1..colN`
//! - Shared predicate: counts and pages use the same conjunction
//! - Fixed page size of 1000 rows

mod ast;
mod errors;
mod planner;

pub use ast::{Conjunction, FilterMap, Page, Predicate, PAGE_SIZE};
pub use errors::{PlannerError, PlannerErrorCode, PlannerResult};
pub use planner::{QueryPlan, QueryPlanner};
