//! Normalized search results.

use super::person::PersonDocument;

/// Default number of documents materialized per search.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Documents returned by a search.
///
/// `total_matches` counts every matching document in the index; `documents`
/// holds at most the requested number of them, best match first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    pub total_matches: u64,
    pub documents: Vec<PersonDocument>,
}

impl ResultSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.total_matches == 0
    }

    /// Whether matches exist beyond the materialized documents.
    pub fn is_truncated(&self) -> bool {
        (self.documents.len() as u64) < self.total_matches
    }
}
