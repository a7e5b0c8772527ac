//! # Text Search
//!
//! Case-insensitive substring search shared by the customer and catalog
//! views.
//!
//! ## Properties
//! - An empty (or whitespace-only) query matches everything.
//! - A record matches when any of its searchable fields contains the term.
//! - Filtering a result again with the same query returns it unchanged.

/// Implemented by records that can be found through the search box.
pub trait Searchable {
    /// Fields the search term is matched against. `None` fields are skipped.
    fn search_fields(&self) -> Vec<Option<&str>>;
}

/// A normalized search term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    term: String,
}

impl SearchQuery {
    /// Trims and lowercases `text`.
    pub fn new(text: &str) -> Self {
        SearchQuery {
            term: text.trim().to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.term.is_empty()
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// True if `field` contains the term, ignoring case.
    pub fn matches_field(&self, field: &str) -> bool {
        self.is_empty() || field.to_lowercase().contains(&self.term)
    }

    /// True if any field of `record` contains the term.
    pub fn matches<T: Searchable + ?Sized>(&self, record: &T) -> bool {
        if self.is_empty() {
            return true;
        }
        record
            .search_fields()
            .into_iter()
            .flatten()
            .any(|field| self.matches_field(field))
    }

    /// Keeps matching records, preserving their order.
    pub fn filter<T: Searchable + Clone>(&self, records: &[T]) -> Vec<T> {
        records.iter().filter(|r| self.matches(*r)).cloned().collect()
    }
}

/// Case-insensitive membership test used by tag filters.
pub(crate) fn contains_ignore_case(haystack: &[String], needle: &str) -> bool {
    haystack.iter().any(|h| h.eq_ignore_ascii_case(needle.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        name: &'static str,
        city: Option<&'static str>,
    }

    impl Searchable for Row {
        fn search_fields(&self) -> Vec<Option<&str>> {
            vec![Some(self.name), self.city]
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { name: "Amina Juma", city: Some("Arusha") },
            Row { name: "Baraka Mushi", city: None },
            Row { name: "Chausiku", city: Some("Dar es Salaam") },
        ]
    }

    #[test]
    fn test_empty_query_is_identity() {
        assert_eq!(SearchQuery::new("").filter(&rows()), rows());
        assert_eq!(SearchQuery::new("   ").filter(&rows()), rows());
    }

    #[test]
    fn test_case_insensitive_any_field() {
        let q = SearchQuery::new("  ARUSHA ");
        let hits = q.filter(&rows());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Amina Juma");

        let hits = SearchQuery::new("mushi").filter(&rows());
        assert_eq!(hits[0].name, "Baraka Mushi");
    }

    #[test]
    fn test_results_all_match_and_refilter_is_idempotent() {
        let q = SearchQuery::new("a");
        let once = q.filter(&rows());
        assert!(once.iter().all(|r| q.matches(r)));
        assert_eq!(q.filter(&once), once);
    }

    #[test]
    fn test_none_fields_are_skipped() {
        let q = SearchQuery::new("salaam");
        assert!(!q.matches(&Row { name: "X", city: None }));
    }

    #[test]
    fn test_contains_ignore_case() {
        let tags = vec!["VIP".to_string(), "new".to_string()];
        assert!(contains_ignore_case(&tags, "vip"));
        assert!(contains_ignore_case(&tags, " New"));
        assert!(!contains_ignore_case(&tags, "complainer"));
    }
}
