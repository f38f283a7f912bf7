//! TableDescriptor value object.

use super::errors::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("identifier regex"));

/// A validated reference to the source table, optionally schema-qualified.
///
/// Table names are interpolated into SQL text (identifiers cannot be bound as
/// parameters), so only plain identifiers are accepted.
///
/// # Example
///
/// ```
/// use person_search_sync::domain::TableDescriptor;
///
/// let table: TableDescriptor = "public.persons".parse().unwrap();
/// assert_eq!(table.qualified_name(), "\"public\".\"persons\"");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableDescriptor {
    schema: Option<String>,
    table: String,
}

impl TableDescriptor {
    /// Create a descriptor for an unqualified table.
    pub fn new(table: impl Into<String>) -> Result<Self, ValidationError> {
        let table = Self::validate(table.into())?;
        Ok(Self {
            schema: None,
            table,
        })
    }

    /// Create a descriptor for a schema-qualified table.
    pub fn with_schema(
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            schema: Some(Self::validate(schema.into())?),
            table: Self::validate(table.into())?,
        })
    }

    fn validate(name: String) -> Result<String, ValidationError> {
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !IDENTIFIER.is_match(&name) {
            return Err(ValidationError::InvalidTableName(name));
        }
        Ok(name)
    }

    /// The bare table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The schema, if qualified.
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Quoted identifier suitable for SQL text.
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("\"{}\".\"{}\"", schema, self.table),
            None => format!("\"{}\"", self.table),
        }
    }
}

impl Default for TableDescriptor {
    /// The `persons` table in the connection's default schema.
    fn default() -> Self {
        Self {
            schema: None,
            table: "persons".to_string(),
        }
    }
}

impl FromStr for TableDescriptor {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((schema, table)) => Self::with_schema(schema, table),
            None => Self::new(s),
        }
    }
}

impl fmt::Display for TableDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.table),
            None => write!(f, "{}", self.table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_valid() {
        let table = TableDescriptor::new("persons").unwrap();
        assert_eq!(table.table(), "persons");
        assert_eq!(table.schema(), None);
        assert_eq!(table.qualified_name(), "\"persons\"");
    }

    #[test]
    fn test_table_with_schema() {
        let table: TableDescriptor = "people.persons".parse().unwrap();
        assert_eq!(table.schema(), Some("people"));
        assert_eq!(table.to_string(), "people.persons");
    }

    #[test]
    fn test_table_rejects_empty() {
        assert_eq!(TableDescriptor::new(""), Err(ValidationError::EmptyName));
    }

    #[test]
    fn test_table_rejects_injection() {
        assert!(TableDescriptor::new("persons; DROP TABLE persons").is_err());
        assert!(TableDescriptor::new("persons\"").is_err());
        assert!("a.b.c".parse::<TableDescriptor>().is_err());
        assert!(TableDescriptor::new("1persons").is_err());
    }
}
