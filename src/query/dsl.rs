//! Leaf clauses of the search engine's JSON query language.

use serde_json::{json, Map, Value};

use crate::models::PersonField;

/// `{clause: {field: body}}`
pub fn field_clause(clause: &str, field: &str, body: Value) -> Value {
    let mut inner = Map::new();
    inner.insert(field.to_string(), body);

    let mut outer = Map::new();
    outer.insert(clause.to_string(), Value::Object(inner));
    Value::Object(outer)
}

/// Relevance-scored match of analyzed text.
pub fn match_clause(field: PersonField, text: &str) -> Value {
    field_clause("match", field.index_name(), json!({ "query": text }))
}

/// Wildcard pattern (`*` any run, `?` one character), case-insensitive.
pub fn wildcard_clause(field: PersonField, pattern: &str) -> Value {
    field_clause(
        "wildcard",
        field.index_name(),
        json!({ "value": pattern, "case_insensitive": true }),
    )
}

/// Term within `fuzziness` edits of `value`.
pub fn fuzzy_clause(field: PersonField, value: &str, fuzziness: u8) -> Value {
    field_clause(
        "fuzzy",
        field.index_name(),
        json!({ "value": value, "fuzziness": fuzziness }),
    )
}

/// Inclusive date range covering one calendar year.
pub fn year_range_clause(field: PersonField, year: i32) -> Value {
    field_clause(
        "range",
        field.index_name(),
        json!({
            "gte": format!("{:04}-01-01", year),
            "lte": format!("{:04}-12-31", year)
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_clause() {
        let clause = match_clause(PersonField::FirstName, "Rahul");
        assert_eq!(clause, json!({ "match": { "FirstName": { "query": "Rahul" } } }));
    }

    #[test]
    fn test_year_range_clause_is_inclusive_year() {
        let clause = year_range_clause(PersonField::DateOfBirth, 1990);
        assert_eq!(clause["range"]["DOB"]["gte"], "1990-01-01");
        assert_eq!(clause["range"]["DOB"]["lte"], "1990-12-31");
    }

    #[test]
    fn test_fuzzy_clause() {
        let clause = fuzzy_clause(PersonField::LastName, "sharma", 2);
        assert_eq!(clause["fuzzy"]["LastName"]["fuzziness"], 2);
    }
}
