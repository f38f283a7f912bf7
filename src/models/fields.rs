//! Index field names and their typing.
//!
//! State, ZipCode and Email are exact-match keyword fields; the name and city
//! fields are tokenized text; DOB is a date. Changing a kind here changes how
//! wildcard and fuzzy queries behave against the index without any error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How the search index stores and analyzes a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Tokenized and lowercased; supports partial and fuzzy matching
    Text,
    /// Stored verbatim; exact matching only
    Keyword,
    /// Calendar date; supports range queries
    Date,
}

impl FieldKind {
    /// Mapping type name understood by the search engine.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Keyword => "keyword",
            Self::Date => "date",
        }
    }
}

/// A person attribute, addressable both as a row-store column and an index field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersonField {
    FirstName,
    LastName,
    PreferredName,
    City,
    State,
    ZipCode,
    DateOfBirth,
    Email,
}

impl PersonField {
    /// All fields in row-store column order.
    pub const ALL: [PersonField; 8] = [
        PersonField::FirstName,
        PersonField::LastName,
        PersonField::PreferredName,
        PersonField::City,
        PersonField::State,
        PersonField::ZipCode,
        PersonField::DateOfBirth,
        PersonField::Email,
    ];

    /// Field name in the search index.
    pub fn index_name(&self) -> &'static str {
        match self {
            Self::FirstName => "FirstName",
            Self::LastName => "LastName",
            Self::PreferredName => "PreferredName",
            Self::City => "City",
            Self::State => "State",
            Self::ZipCode => "ZipCode",
            Self::DateOfBirth => "DOB",
            Self::Email => "Email",
        }
    }

    /// Column name in the row store.
    pub fn column(&self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::PreferredName => "preferred_name",
            Self::City => "city",
            Self::State => "state",
            Self::ZipCode => "zip_code",
            Self::DateOfBirth => "dob",
            Self::Email => "email",
        }
    }

    /// Index typing for this field.
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::FirstName | Self::LastName | Self::PreferredName | Self::City => FieldKind::Text,
            Self::State | Self::ZipCode | Self::Email => FieldKind::Keyword,
            Self::DateOfBirth => FieldKind::Date,
        }
    }

    /// Look up a field by its index name.
    pub fn from_index_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.index_name() == name)
    }
}

impl fmt::Display for PersonField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.index_name())
    }
}

impl FromStr for PersonField {
    type Err = String;

    /// Accepts the index name (`FirstName`, `DOB`), the column name
    /// (`first_name`, `dob`), or `DateOfBirth`, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|f| {
                f.index_name().eq_ignore_ascii_case(wanted)
                    || f.column().eq_ignore_ascii_case(wanted)
                    || format!("{:?}", f).eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| format!("unknown person field: {}", s))
    }
}

/// Field name to field kind, as used when creating an index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldTypeMap {
    fields: BTreeMap<String, FieldKind>,
}

impl FieldTypeMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// The fixed typing for person documents.
    pub fn person() -> Self {
        PersonField::ALL
            .into_iter()
            .fold(Self::new(), |map, f| map.with(f.index_name(), f.kind()))
    }

    /// Add or replace a field.
    pub fn with(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.insert(name.into(), kind);
        self
    }

    /// Kind of a field, if mapped.
    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        self.fields.get(name).copied()
    }

    /// Iterate over mapped fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldKind)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Index creation body: `{"mappings": {"properties": {...}}}`.
    pub fn to_mapping_body(&self) -> serde_json::Value {
        let properties: serde_json::Map<String, serde_json::Value> = self
            .iter()
            .map(|(name, kind)| {
                (
                    name.to_string(),
                    serde_json::json!({ "type": kind.as_str() }),
                )
            })
            .collect();

        serde_json::json!({ "mappings": { "properties": properties } })
    }
}
