//! Outcome of a bulk write.

use super::person::PersonDocument;

/// A document the index refused, with the backend's reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkFailure {
    pub document: PersonDocument,
    pub cause: String,
}

/// Per-document outcome of one bulk write call.
///
/// Partial failure is a normal result: `failed` lists every rejected document
/// and `succeeded` counts the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkResult {
    pub succeeded: usize,
    pub failed: Vec<BulkFailure>,
}

impl BulkResult {
    /// A result where every document was accepted.
    pub fn all_succeeded(count: usize) -> Self {
        Self {
            succeeded: count,
            failed: Vec::new(),
        }
    }

    /// Number of rejected documents.
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Total documents submitted.
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}
