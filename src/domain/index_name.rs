//! IndexName value object.

use super::errors::ValidationError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const FORBIDDEN: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ' ', ',', '#', ':'];

/// A type-safe wrapper for search index names.
///
/// Enforces the search engine's naming rules at construction time: lowercase,
/// no path or wildcard characters, no leading `-`, `_` or `+`, at most 255 bytes.
///
/// # Example
///
/// ```
/// use person_search_sync::domain::IndexName;
///
/// let name = IndexName::new("person_index").unwrap();
/// assert_eq!(name.as_str(), "person_index");
/// assert!(IndexName::new("Person_Index").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexName(String);

impl IndexName {
    /// Create a new IndexName, validating the engine's naming rules.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyName` for an empty name and
    /// `ValidationError::InvalidIndexName` for any other rule violation.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if let Some(reason) = Self::violation(&name) {
            return Err(ValidationError::InvalidIndexName { name, reason });
        }
        Ok(Self(name))
    }

    fn violation(name: &str) -> Option<&'static str> {
        if name.len() > 255 {
            return Some("longer than 255 bytes");
        }
        if name == "." || name == ".." {
            return Some("reserved name");
        }
        if name.starts_with(['-', '_', '+']) {
            return Some("must not start with '-', '_' or '+'");
        }
        if name.chars().any(|c| c.is_uppercase()) {
            return Some("must be lowercase");
        }
        if name.contains(FORBIDDEN) {
            return Some("contains a forbidden character");
        }
        None
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into the underlying String.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Default for IndexName {
    fn default() -> Self {
        Self("person_index".to_string())
    }
}

impl FromStr for IndexName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for IndexName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for IndexName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for IndexName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        IndexName::new(s).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_name_valid() {
        let name = IndexName::new("person_index").unwrap();
        assert_eq!(name.as_str(), "person_index");
        assert_eq!(format!("{}", name), "person_index");
    }

    #[test]
    fn test_index_name_rejects_empty() {
        assert_eq!(IndexName::new(""), Err(ValidationError::EmptyName));
    }

    #[test]
    fn test_index_name_rejects_rule_violations() {
        assert!(IndexName::new("People").is_err());
        assert!(IndexName::new("_people").is_err());
        assert!(IndexName::new("people/index").is_err());
        assert!(IndexName::new("people*").is_err());
        assert!(IndexName::new("..").is_err());
        assert!(IndexName::new("a".repeat(256)).is_err());
    }

    #[test]
    fn test_index_name_deserialization_validates() {
        let ok: IndexName = serde_json::from_str("\"person_index\"").unwrap();
        assert_eq!(ok.as_str(), "person_index");

        let bad: Result<IndexName, _> = serde_json::from_str("\"Bad Name\"");
        assert!(bad.is_err());
    }
}
