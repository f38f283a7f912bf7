//! Domain validation errors.

use std::fmt;

/// Errors that can occur during domain value object validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided name is empty.
    EmptyName,

    /// The provided table reference is not a plain SQL identifier.
    InvalidTableName(String),

    /// The provided index name breaks the search engine's naming rules.
    InvalidIndexName { name: String, reason: &'static str },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Name cannot be empty"),
            Self::InvalidTableName(name) => write!(f, "Invalid table name: {}", name),
            Self::InvalidIndexName { name, reason } => {
                write!(f, "Invalid index name '{}': {}", name, reason)
            }
        }
    }
}

impl std::error::Error for ValidationError {}
