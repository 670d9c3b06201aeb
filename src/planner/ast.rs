//! Filter and predicate structures
//!
//! Defines the caller-facing filter map and the validated predicate form
//! consumed by the executor.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{PlannerError, PlannerResult};
use crate::schema::ColumnId;

/// Fixed page size for paginated reads
pub const PAGE_SIZE: u64 = 1000;

/// Caller-supplied column → substring mapping.
///
/// Keys are untrusted until the planner resolves them against a schema.
/// Ordered so that plans built from the same map are identical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterMap(BTreeMap<String, String>);

impl FilterMap {
    /// Creates an empty filter map
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry
    pub fn with(mut self, column: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.0.insert(column.into(), pattern.into());
        self
    }

    /// Decodes the JSON object form used on the wire.
    ///
    /// String values are taken as-is, `null` counts as empty, numbers and
    /// booleans use their JSON text. Nested values are rejected.
    pub fn from_json(raw: &str) -> PlannerResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::new());
        }

        let value: Value = serde_json::from_str(trimmed)
            .map_err(|e| PlannerError::invalid_filter(format!("Filters are not valid JSON: {}", e)))?;

        let object = match value {
            Value::Object(map) => map,
            Value::Null => return Ok(Self::new()),
            _ => return Err(PlannerError::invalid_filter("Filters must be a JSON object")),
        };

        let mut filters = BTreeMap::new();
        for (key, value) in object {
            let pattern = match value {
                Value::String(s) => s,
                Value::Null => String::new(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(PlannerError::invalid_filter(format!(
                        "Filter value for '{}' must be a string",
                        key
                    )))
                }
            };
            filters.insert(key, pattern);
        }

        Ok(Self(filters))
    }

    /// Entries with a non-empty pattern, in key order
    pub fn active_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns true if no entry would produce a predicate
    pub fn is_effectively_empty(&self) -> bool {
        self.active_entries().next().is_none()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FilterMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Substring predicate on one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    /// Column the pattern applies to
    pub column: ColumnId,
    /// Pattern as supplied (case folding happens at match time)
    pub pattern: String,
}

impl Predicate {
    /// Create a contains predicate
    pub fn contains(column: ColumnId, pattern: impl Into<String>) -> Self {
        Self {
            column,
            pattern: pattern.into(),
        }
    }
}

/// AND of predicates; empty means always true
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conjunction {
    predicates: Vec<Predicate>,
}

impl Conjunction {
    /// The always-true predicate
    pub fn always() -> Self {
        Self::default()
    }

    /// Builds a conjunction, ordering predicates by column position
    pub fn of(mut predicates: Vec<Predicate>) -> Self {
        predicates.sort_by(|a, b| a.column.cmp(&b.column).then_with(|| a.pattern.cmp(&b.pattern)));
        Self { predicates }
    }

    /// Predicates in evaluation order
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Returns true if every row matches
    pub fn is_always_true(&self) -> bool {
        self.predicates.is_empty()
    }
}

/// 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page(u64);

impl Page {
    /// First page
    pub const FIRST: Page = Page(1);

    /// Validates a caller-supplied page number.
    ///
    /// Pages below 1 are rejected, not clamped.
    pub fn new(number: i64) -> PlannerResult<Self> {
        if number < 1 {
            return Err(PlannerError::invalid_page(number));
        }
        Ok(Self(number as u64))
    }

    /// Page number
    pub fn number(&self) -> u64 {
        self.0
    }

    /// Row offset of the first row on this page
    pub fn offset(&self) -> PlannerResult<u64> {
        (self.0 - 1)
            .checked_mul(PAGE_SIZE)
            .ok_or_else(|| PlannerError::invalid_page(self.0 as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_map_from_json() {
        let f = FilterMap::from_json(r#"{"col1": "ab", "col2": "", "col3": null, "col4": 7}"#)
            .unwrap();
        let active: Vec<_> = f.active_entries().collect();
        assert_eq!(active, vec![("col1", "ab"), ("col4", "7")]);
    }

    #[test]
    fn test_filter_map_empty_forms() {
        assert!(FilterMap::from_json("").unwrap().is_effectively_empty());
        assert!(FilterMap::from_json("{}").unwrap().is_effectively_empty());
        assert!(FilterMap::from_json("null").unwrap().is_effectively_empty());
    }

    #[test]
    fn test_filter_map_rejects_bad_json() {
        assert!(FilterMap::from_json("{col1:").is_err());
        assert!(FilterMap::from_json("[1,2]").is_err());
        assert!(FilterMap::from_json(r#"{"col1": ["a"]}"#).is_err());
    }

    #[test]
    fn test_page_offsets() {
        assert_eq!(Page::FIRST.offset().unwrap(), 0);
        assert_eq!(Page::new(3).unwrap().offset().unwrap(), 2000);
        assert!(Page::new(0).is_err());
        assert!(Page::new(-4).is_err());
        assert!(Page::new(i64::MAX).unwrap().offset().is_err());
    }

    #[test]
    fn test_conjunction_is_ordered() {
        let c2 = ColumnId::from_index(1);
        let c1 = ColumnId::from_index(0);
        let conj = Conjunction::of(vec![Predicate::contains(c2, "x"), Predicate::contains(c1, "y")]);
        assert_eq!(conj.predicates()[0].column, c1);
        assert!(!conj.is_always_true());
        assert!(Conjunction::always().is_always_true());
    }
}
