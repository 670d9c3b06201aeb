//! Predicate filtering for query execution
//!
//! Substring containment only, ASCII case-insensitive. Pattern characters
//! are literal: `%` and `_` carry no wildcard meaning.

use crate::planner::Conjunction;

/// Evaluates one conjunction against rows.
///
/// Patterns are case-folded once at construction so that the count, the
/// page read and an export of the same conjunction all match identically.
#[derive(Debug, Clone)]
pub struct PredicateFilter {
    /// (0-based column index, lowercased pattern)
    terms: Vec<(usize, String)>,
}

impl PredicateFilter {
    /// Compiles a conjunction into a filter.
    pub fn new(conjunction: &Conjunction) -> Self {
        let terms = conjunction
            .predicates()
            .iter()
            .map(|p| (p.column.index(), p.pattern.to_ascii_lowercase()))
            .collect();
        Self { terms }
    }

    /// Returns true if the filter matches every row.
    pub fn is_always_true(&self) -> bool {
        self.terms.is_empty()
    }

    /// Checks if a row satisfies all predicates.
    pub fn matches(&self, row: &[String]) -> bool {
        // All predicates must match (AND semantics)
        self.terms.iter().all(|(index, pattern)| match row.get(*index) {
            Some(value) => contains_ignore_ascii_case(value, pattern),
            // Missing field = no match
            None => false,
        })
    }
}

fn contains_ignore_ascii_case(haystack: &str, lowered_needle: &str) -> bool {
    if lowered_needle.is_empty() {
        return true;
    }
    let needle = lowered_needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::Predicate;
    use crate::schema::ColumnId;

    fn filter(terms: &[(usize, &str)]) -> PredicateFilter {
        PredicateFilter::new(&Conjunction::of(
            terms
                .iter()
                .map(|(i, p)| Predicate::contains(ColumnId::from_index(*i), *p))
                .collect(),
        ))
    }

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_substring_match() {
        let f = filter(&[(0, "ob")]);
        assert!(f.matches(&row(&["bob", "x"])));
        assert!(f.matches(&row(&["Robert", "x"])));
        assert!(!f.matches(&row(&["alice", "x"])));
    }

    #[test]
    fn test_case_insensitive_ascii() {
        let f = filter(&[(0, "BoB")]);
        assert!(f.matches(&row(&["bob"])));
        assert!(f.matches(&row(&["BOBBY"])));
    }

    #[test]
    fn test_non_ascii_compared_exactly() {
        let f = filter(&[(0, "zü")]);
        assert!(f.matches(&row(&["Zürich"])));
        assert!(!f.matches(&row(&["ZÜRICH"])));
    }

    #[test]
    fn test_wildcards_are_literal() {
        let f = filter(&[(0, "5%")]);
        assert!(f.matches(&row(&["up 5% today"])));
        assert!(!f.matches(&row(&["up 50 today"])));

        let f = filter(&[(0, "a_b")]);
        assert!(f.matches(&row(&["xa_by"])));
        assert!(!f.matches(&row(&["axb"])));
    }

    #[test]
    fn test_conjunction_requires_all() {
        let f = filter(&[(0, "a"), (1, "z")]);
        assert!(f.matches(&row(&["abc", "xyz"])));
        assert!(!f.matches(&row(&["abc", "xy"])));
    }

    #[test]
    fn test_empty_conjunction_matches_everything() {
        let f = PredicateFilter::new(&Conjunction::always());
        assert!(f.is_always_true());
        assert!(f.matches(&row(&["", ""])));
    }

    #[test]
    fn test_pattern_longer_than_value() {
        let f = filter(&[(0, "abcdef")]);
        assert!(!f.matches(&row(&["abc"])));
    }
}
