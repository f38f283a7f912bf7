//! Search intents and the query bodies built from them.
//!
//! Builders perform no I/O. Every required parameter is validated before any
//! part of the body is constructed.

use serde_json::{json, Value};
use std::fmt;

use super::dsl;
use crate::error::{SearchError, SearchResult};
use crate::models::{FieldKind, PersonField};

/// Edit distance used when a fuzzy search does not specify one.
pub const DEFAULT_FUZZY_DISTANCE: u8 = 2;

/// Largest edit distance the index supports.
pub const MAX_FUZZY_DISTANCE: u8 = 2;

/// The supported search shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchIntent {
    /// Analyzed, relevance-scored match on one field.
    Match { field: String, text: String },

    /// First and last name substrings and a birth year, all required.
    WildcardRange {
        first_name: String,
        last_name: String,
        birth_year: i32,
    },

    /// One field within an edit distance of a value.
    Fuzzy {
        field: String,
        value: String,
        distance: Option<u8>,
    },

    /// The wildcard-and-range conditions, any one of which suffices.
    AnyOf {
        first_name: String,
        last_name: String,
        birth_year: i32,
    },
}

impl SearchIntent {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Match { .. } => "match",
            Self::WildcardRange { .. } => "wildcard",
            Self::Fuzzy { .. } => "fuzzy",
            Self::AnyOf { .. } => "any",
        }
    }
}

/// A validated query, ready to execute.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBody(Value);

impl QueryBody {
    /// The `{"query": ...}` body.
    pub fn as_json(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }

    /// The request body with a result cap and exact total counting.
    pub fn with_size(&self, size: usize) -> Value {
        let mut body = self.0.clone();
        if let Value::Object(map) = &mut body {
            map.insert("size".to_string(), json!(size));
            map.insert("track_total_hits".to_string(), json!(true));
        }
        body
    }
}

impl fmt::Display for QueryBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Builds query bodies for each [`SearchIntent`].
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryBuilder;

impl QueryBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the body for any intent.
    pub fn build(&self, intent: &SearchIntent) -> SearchResult<QueryBody> {
        match intent {
            SearchIntent::Match { field, text } => self.match_query(field, text),
            SearchIntent::WildcardRange {
                first_name,
                last_name,
                birth_year,
            } => self.wildcard_range_query(first_name, last_name, *birth_year),
            SearchIntent::Fuzzy {
                field,
                value,
                distance,
            } => self.fuzzy_query(field, value, *distance),
            SearchIntent::AnyOf {
                first_name,
                last_name,
                birth_year,
            } => self.any_of_query(first_name, last_name, *birth_year),
        }
    }

    /// Analyzed match of `text` against one field.
    pub fn match_query(&self, field: &str, text: &str) -> SearchResult<QueryBody> {
        let field = parse_field(field)?;
        let text = required("text", text)?;
        Ok(wrap(dsl::match_clause(field, text)))
    }

    /// Both name substrings and the birth year must match.
    pub fn wildcard_range_query(
        &self,
        first_name: &str,
        last_name: &str,
        birth_year: i32,
    ) -> SearchResult<QueryBody> {
        let clauses = name_and_year_clauses(first_name, last_name, birth_year)?;
        Ok(wrap(json!({ "bool": { "must": clauses } })))
    }

    /// Field value within `distance` edits (default 2) of `value`.
    pub fn fuzzy_query(
        &self,
        field: &str,
        value: &str,
        distance: Option<u8>,
    ) -> SearchResult<QueryBody> {
        let field = parse_field(field)?;
        let value = required("value", value)?;
        let distance = distance.unwrap_or(DEFAULT_FUZZY_DISTANCE);
        if distance > MAX_FUZZY_DISTANCE {
            return Err(SearchError::InvalidParameter(format!(
                "fuzzy distance must be at most {}, got {}",
                MAX_FUZZY_DISTANCE, distance
            )));
        }
        if field.kind() == FieldKind::Date {
            return Err(SearchError::InvalidParameter(format!(
                "field {} is a date and cannot be searched fuzzily",
                field
            )));
        }

        // Fuzzy is a term-level query: compare against the analyzed (lowercased)
        // terms of text fields.
        let term = match field.kind() {
            FieldKind::Text => value.to_lowercase(),
            _ => value.to_string(),
        };
        Ok(wrap(dsl::fuzzy_clause(field, &term, distance)))
    }

    /// Any one of the name substrings or the birth year suffices.
    pub fn any_of_query(
        &self,
        first_name: &str,
        last_name: &str,
        birth_year: i32,
    ) -> SearchResult<QueryBody> {
        let clauses = name_and_year_clauses(first_name, last_name, birth_year)?;
        Ok(wrap(json!({
            "bool": {
                "should": clauses,
                "minimum_should_match": 1
            }
        })))
    }
}

fn wrap(query: Value) -> QueryBody {
    QueryBody(json!({ "query": query }))
}

fn required<'a>(name: &str, value: &'a str) -> SearchResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SearchError::InvalidParameter(format!("{} is required", name)));
    }
    Ok(trimmed)
}

fn parse_field(name: &str) -> SearchResult<PersonField> {
    let name = required("field name", name)?;
    name.parse::<PersonField>()
        .map_err(SearchError::InvalidParameter)
}

fn name_and_year_clauses(
    first_name: &str,
    last_name: &str,
    birth_year: i32,
) -> SearchResult<Vec<Value>> {
    let first_name = required("first name", first_name)?;
    let last_name = required("last name", last_name)?;
    if !(1..=9999).contains(&birth_year) {
        return Err(SearchError::InvalidParameter(format!(
            "birth year must be between 1 and 9999, got {}",
            birth_year
        )));
    }

    Ok(vec![
        dsl::wildcard_clause(PersonField::FirstName, &format!("*{}*", first_name)),
        dsl::wildcard_clause(PersonField::LastName, &format!("*{}*", last_name)),
        dsl::year_range_clause(PersonField::DateOfBirth, birth_year),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_query() {
        let body = QueryBuilder::new().match_query("FirstName", "Rahul").unwrap();
        assert_eq!(
            body.as_json(),
            &json!({ "query": { "match": { "FirstName": { "query": "Rahul" } } } })
        );
    }

    #[test]
    fn test_blank_field_name_rejected() {
        let err = QueryBuilder::new().match_query("  ", "Rahul").unwrap_err();
        assert!(matches!(err, SearchError::InvalidParameter(_)));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = QueryBuilder::new().match_query("BirthDate", "1990").unwrap_err();
        assert!(matches!(err, SearchError::InvalidParameter(_)));
    }

    #[test]
    fn test_wildcard_range_is_conjunctive() {
        let body = QueryBuilder::new()
            .wildcard_range_query("Rah", "Sharm", 1990)
            .unwrap();
        let must = body.as_json()["query"]["bool"]["must"].as_array().unwrap();
        assert_eq!(must.len(), 3);
        assert_eq!(must[0]["wildcard"]["FirstName"]["value"], "*Rah*");
        assert_eq!(must[1]["wildcard"]["LastName"]["case_insensitive"], true);
        assert_eq!(must[2]["range"]["DOB"]["gte"], "1990-01-01");
        assert_eq!(must[2]["range"]["DOB"]["lte"], "1990-12-31");
    }

    #[test]
    fn test_any_of_is_disjunctive() {
        let body = QueryBuilder::new().any_of_query("Rah", "Sharm", 1990).unwrap();
        let bool_query = &body.as_json()["query"]["bool"];
        assert_eq!(bool_query["should"].as_array().unwrap().len(), 3);
        assert_eq!(bool_query["minimum_should_match"], 1);
        assert!(bool_query.get("must").is_none());
    }

    #[test]
    fn test_wildcard_rejects_blank_names_and_bad_years() {
        let builder = QueryBuilder::new();
        assert!(builder.wildcard_range_query("", "Sharma", 1990).is_err());
        assert!(builder.any_of_query("Rahul", " ", 1990).is_err());
        assert!(builder.wildcard_range_query("Rahul", "Sharma", 0).is_err());
        assert!(builder.any_of_query("Rahul", "Sharma", 10_000).is_err());
    }

    #[test]
    fn test_fuzzy_defaults_and_limits() {
        let builder = QueryBuilder::new();
        let body = builder.fuzzy_query("FirstName", "Rahul", None).unwrap();
        let fuzzy = &body.as_json()["query"]["fuzzy"]["FirstName"];
        assert_eq!(fuzzy["value"], "rahul");
        assert_eq!(fuzzy["fuzziness"], 2);

        let keyword = builder.fuzzy_query("State", "MH", Some(1)).unwrap();
        assert_eq!(keyword.as_json()["query"]["fuzzy"]["State"]["value"], "MH");

        assert!(builder.fuzzy_query("FirstName", "Rahul", Some(3)).is_err());
        assert!(builder.fuzzy_query("DOB", "1990-05-10", None).is_err());
        assert!(builder.fuzzy_query("FirstName", "", None).is_err());
    }

    #[test]
    fn test_build_dispatches_intents() {
        let intent = SearchIntent::Fuzzy {
            field: "last_name".to_string(),
            value: "Sharma".to_string(),
            distance: Some(1),
        };
        let body = QueryBuilder::new().build(&intent).unwrap();
        assert_eq!(body.as_json()["query"]["fuzzy"]["LastName"]["fuzziness"], 1);
        assert_eq!(intent.name(), "fuzzy");
    }

    #[test]
    fn test_with_size_adds_cap_and_total_tracking() {
        let body = QueryBuilder::new()
            .match_query("City", "Pune")
            .unwrap()
            .with_size(5);
        assert_eq!(body["size"], 5);
        assert_eq!(body["track_total_hits"], true);
    }
}
