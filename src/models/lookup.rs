//! Equivalent person lookup across both backends.

use serde_json::json;

use super::fields::PersonField;
use crate::query::dsl;

/// Exact first and last name plus a preferred-name pattern.
///
/// The pattern uses SQL `LIKE` syntax (`%` for any run, `_` for one character);
/// [`PersonLookup::index_query`] translates it to the index's wildcard syntax so
/// both backends evaluate the same predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonLookup {
    pub first_name: String,
    pub last_name: String,
    pub preferred_name_pattern: String,
}

impl PersonLookup {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        preferred_name_pattern: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            preferred_name_pattern: preferred_name_pattern.into(),
        }
    }

    /// The first empty field, if any.
    pub fn missing_field(&self) -> Option<PersonField> {
        if self.first_name.trim().is_empty() {
            Some(PersonField::FirstName)
        } else if self.last_name.trim().is_empty() {
            Some(PersonField::LastName)
        } else if self.preferred_name_pattern.trim().is_empty() {
            Some(PersonField::PreferredName)
        } else {
            None
        }
    }

    /// Preferred-name pattern in wildcard syntax.
    pub fn wildcard_pattern(&self) -> String {
        self.preferred_name_pattern
            .chars()
            .map(|c| match c {
                '%' => '*',
                '_' => '?',
                other => other,
            })
            .collect()
    }

    /// Index request body evaluating the same predicate.
    pub fn index_query(&self) -> serde_json::Value {
        json!({
            "query": {
                "bool": {
                    "must": [
                        dsl::match_clause(PersonField::FirstName, &self.first_name),
                        dsl::match_clause(PersonField::LastName, &self.last_name),
                        dsl::wildcard_clause(PersonField::PreferredName, &self.wildcard_pattern())
                    ]
                }
            }
        })
    }
}
