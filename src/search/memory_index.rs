//! In-process search index.
//!
//! Evaluates the same JSON query bodies the REST engine accepts (`match`,
//! `term`, `wildcard`, `fuzzy`, `range`, `bool`, `match_all`) against stored
//! documents, analyzing each field according to the [`FieldTypeMap`] the
//! index was created with:
//!
//! - text fields are lowercased and split into terms; queries match terms
//! - keyword fields are compared verbatim against the whole value
//! - date fields hold ISO `YYYY-MM-DD` values; anything else is rejected at write
//!
//! A wrong field typing therefore changes results without raising an error,
//! exactly like the real engine.

use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::RwLock;

use super::analysis::{edit_distance, tokenize, wildcard_regex};
use crate::domain::IndexName;
use crate::error::{GatewayError, GatewayResult};
use crate::models::{
    BulkFailure, BulkResult, FieldKind, FieldTypeMap, PersonDocument, PersonField, DATE_FORMAT,
};
use crate::repositories::SearchIndexGateway;

/// Total hit count reported when exact counting is not requested.
const DEFAULT_TRACK_TOTAL_HITS: u64 = 10_000;

const DEFAULT_SIZE: usize = 10;

/// Highest edit distance a fuzzy query may request.
pub const MAX_FUZZINESS: u64 = 2;

struct StoredIndex {
    fields: FieldTypeMap,
    documents: Vec<(String, PersonDocument)>,
    next_id: u64,
}

/// A compiled leaf or compound query.
enum Clause {
    MatchAll,
    MatchNone,
    Match {
        field: PersonField,
        kind: FieldKind,
        text: String,
        terms: Vec<String>,
    },
    Term {
        field: PersonField,
        kind: FieldKind,
        value: String,
    },
    Wildcard {
        field: PersonField,
        kind: FieldKind,
        regex: Regex,
    },
    Fuzzy {
        field: PersonField,
        kind: FieldKind,
        value: String,
        distance: usize,
    },
    Range {
        field: PersonField,
        kind: FieldKind,
        bounds: Vec<(RangeOp, String)>,
    },
    Bool {
        must: Vec<Clause>,
        filter: Vec<Clause>,
        should: Vec<Clause>,
        must_not: Vec<Clause>,
        minimum_should_match: usize,
    },
}

#[derive(Clone, Copy)]
enum RangeOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl RangeOp {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            _ => None,
        }
    }

    fn holds(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            Self::Gt => ordering == Greater,
            Self::Gte => ordering != Less,
            Self::Lt => ordering == Less,
            Self::Lte => ordering != Greater,
        }
    }
}

fn parsing_error(message: impl Into<String>) -> GatewayError {
    GatewayError::Query(format!("parsing_exception: {}", message.into()))
}

/// Split `{name: body}` into its single key and value.
fn single_entry<'a>(clause: &str, value: &'a Value) -> GatewayResult<(&'a str, &'a Value)> {
    let object = value
        .as_object()
        .ok_or_else(|| parsing_error(format!("[{}] query malformed, expected an object", clause)))?;
    let mut entries = object.iter();
    match (entries.next(), entries.next()) {
        (Some((key, body)), None) => Ok((key.as_str(), body)),
        _ => Err(parsing_error(format!(
            "[{}] query must name exactly one field",
            clause
        ))),
    }
}

/// Read a value given either directly or as `{key: value, ...}`.
fn inner_value<'a>(body: &'a Value, key: &str) -> Option<&'a Value> {
    match body {
        Value::Object(map) => map.get(key),
        other => Some(other),
    }
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn clause_list(value: Option<&Value>, fields: &FieldTypeMap) -> GatewayResult<Vec<Clause>> {
    match value {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items.iter().map(|v| compile(v, fields)).collect(),
        Some(single) => Ok(vec![compile(single, fields)?]),
    }
}

/// Resolve a field name against the index mapping. Unmapped fields match nothing.
fn resolve(name: &str, fields: &FieldTypeMap) -> Option<(PersonField, FieldKind)> {
    let field = PersonField::from_index_name(name)?;
    let kind = fields.kind_of(name)?;
    Some((field, kind))
}

fn compile(query: &Value, fields: &FieldTypeMap) -> GatewayResult<Clause> {
    let (name, body) = single_entry("query", query)?;

    match name {
        "match_all" => Ok(Clause::MatchAll),
        "match_none" => Ok(Clause::MatchNone),
        "bool" => compile_bool(body, fields),
        "match" => {
            let (field_name, params) = single_entry(name, body)?;
            let text = inner_value(params, "query")
                .and_then(value_as_string)
                .ok_or_else(|| parsing_error("[match] requires a query value"))?;
            Ok(match resolve(field_name, fields) {
                Some((field, kind)) => Clause::Match {
                    field,
                    kind,
                    terms: tokenize(&text),
                    text,
                },
                None => Clause::MatchNone,
            })
        }
        "term" => {
            let (field_name, params) = single_entry(name, body)?;
            let value = inner_value(params, "value")
                .and_then(value_as_string)
                .ok_or_else(|| parsing_error("[term] requires a value"))?;
            Ok(match resolve(field_name, fields) {
                Some((field, kind)) => Clause::Term { field, kind, value },
                None => Clause::MatchNone,
            })
        }
        "wildcard" => {
            let (field_name, params) = single_entry(name, body)?;
            let pattern = inner_value(params, "value")
                .and_then(Value::as_str)
                .ok_or_else(|| parsing_error("[wildcard] requires a string value"))?;
            let case_insensitive = params
                .get("case_insensitive")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let Some((field, kind)) = resolve(field_name, fields) else {
                return Ok(Clause::MatchNone);
            };
            if kind == FieldKind::Date {
                return Err(GatewayError::Query(format!(
                    "query_shard_exception: field [{}] of type [date] does not support wildcard queries",
                    field_name
                )));
            }
            let regex = wildcard_regex(pattern, case_insensitive)
                .map_err(|e| parsing_error(format!("invalid wildcard pattern: {}", e)))?;
            Ok(Clause::Wildcard { field, kind, regex })
        }
        "fuzzy" => {
            let (field_name, params) = single_entry(name, body)?;
            let value = inner_value(params, "value")
                .and_then(value_as_string)
                .ok_or_else(|| parsing_error("[fuzzy] requires a value"))?;
            let distance = match params.get("fuzziness") {
                None => auto_fuzziness(&value),
                Some(Value::String(s)) if s.eq_ignore_ascii_case("auto") => auto_fuzziness(&value),
                Some(v) => v
                    .as_u64()
                    .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
                    .filter(|d| *d <= MAX_FUZZINESS)
                    .ok_or_else(|| {
                        parsing_error(format!("[fuzzy] fuzziness must be 0..={}", MAX_FUZZINESS))
                    })? as usize,
            };
            let Some((field, kind)) = resolve(field_name, fields) else {
                return Ok(Clause::MatchNone);
            };
            if kind == FieldKind::Date {
                return Err(GatewayError::Query(format!(
                    "query_shard_exception: field [{}] of type [date] does not support fuzzy queries",
                    field_name
                )));
            }
            Ok(Clause::Fuzzy {
                field,
                kind,
                value,
                distance,
            })
        }
        "range" => {
            let (field_name, params) = single_entry(name, body)?;
            let params = params
                .as_object()
                .ok_or_else(|| parsing_error("[range] requires bounds"))?;
            let mut bounds = Vec::new();
            for (op, bound) in params {
                let Some(op) = RangeOp::parse(op) else {
                    continue;
                };
                let bound = value_as_string(bound)
                    .ok_or_else(|| parsing_error("[range] bound must be a scalar"))?;
                bounds.push((op, bound));
            }
            let Some((field, kind)) = resolve(field_name, fields) else {
                return Ok(Clause::MatchNone);
            };
            if kind == FieldKind::Date {
                for (_, bound) in &bounds {
                    if NaiveDate::parse_from_str(bound, DATE_FORMAT).is_err() {
                        return Err(parsing_error(format!(
                            "failed to parse date field [{}]",
                            bound
                        )));
                    }
                }
            }
            Ok(Clause::Range {
                field,
                kind,
                bounds,
            })
        }
        other => Err(parsing_error(format!("unknown query [{}]", other))),
    }
}

fn compile_bool(body: &Value, fields: &FieldTypeMap) -> GatewayResult<Clause> {
    let object = body
        .as_object()
        .ok_or_else(|| parsing_error("[bool] query malformed"))?;

    let must = clause_list(object.get("must"), fields)?;
    let filter = clause_list(object.get("filter"), fields)?;
    let should = clause_list(object.get("should"), fields)?;
    let must_not = clause_list(object.get("must_not"), fields)?;

    let minimum_should_match = match object.get("minimum_should_match") {
        Some(v) => v
            .as_u64()
            .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
            .ok_or_else(|| parsing_error("[bool] minimum_should_match must be a number"))?
            as usize,
        None if must.is_empty() && filter.is_empty() && !should.is_empty() => 1,
        None => 0,
    };

    Ok(Clause::Bool {
        must,
        filter,
        should,
        must_not,
        minimum_should_match,
    })
}

/// Edit distance allowed by `fuzziness: AUTO` for a term of this length.
fn auto_fuzziness(value: &str) -> usize {
    match value.chars().count() {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    }
}

impl Clause {
    /// Relevance score if the document matches.
    fn score(&self, doc: &PersonDocument) -> Option<f64> {
        match self {
            Clause::MatchAll => Some(1.0),
            Clause::MatchNone => None,
            Clause::Match {
                field,
                kind,
                text,
                terms,
            } => {
                let stored = doc.field(*field)?;
                match kind {
                    FieldKind::Text => {
                        let stored_terms = tokenize(stored);
                        let hits = terms
                            .iter()
                            .filter(|t| stored_terms.contains(t))
                            .count();
                        (hits > 0).then(|| hits as f64 / stored_terms.len().max(1) as f64 + 1.0)
                    }
                    FieldKind::Keyword => (stored == text).then_some(1.0),
                    FieldKind::Date => dates_equal(stored, text).then_some(1.0),
                }
            }
            Clause::Term { field, kind, value } => {
                let stored = doc.field(*field)?;
                let matched = match kind {
                    FieldKind::Text => tokenize(stored).iter().any(|t| t == value),
                    FieldKind::Keyword => stored == value,
                    FieldKind::Date => dates_equal(stored, value),
                };
                matched.then_some(1.0)
            }
            Clause::Wildcard { field, kind, regex } => {
                let stored = doc.field(*field)?;
                let matched = match kind {
                    FieldKind::Text => tokenize(stored).iter().any(|t| regex.is_match(t)),
                    _ => regex.is_match(stored),
                };
                matched.then_some(1.0)
            }
            Clause::Fuzzy {
                field,
                kind,
                value,
                distance,
            } => {
                let stored = doc.field(*field)?;
                let best = match kind {
                    FieldKind::Text => tokenize(stored)
                        .iter()
                        .map(|t| edit_distance(t, value))
                        .min()?,
                    _ => edit_distance(stored, value),
                };
                (best <= *distance).then(|| 1.0 / (1.0 + best as f64))
            }
            Clause::Range {
                field,
                kind,
                bounds,
            } => {
                let stored = doc.field(*field)?;
                let within = bounds.iter().all(|(op, bound)| match kind {
                    FieldKind::Date => {
                        match (
                            NaiveDate::parse_from_str(stored, DATE_FORMAT),
                            NaiveDate::parse_from_str(bound, DATE_FORMAT),
                        ) {
                            (Ok(s), Ok(b)) => op.holds(s.cmp(&b)),
                            _ => false,
                        }
                    }
                    _ => op.holds(stored.cmp(bound.as_str())),
                });
                within.then_some(1.0)
            }
            Clause::Bool {
                must,
                filter,
                should,
                must_not,
                minimum_should_match,
            } => {
                if must_not.iter().any(|c| c.score(doc).is_some()) {
                    return None;
                }
                if filter.iter().any(|c| c.score(doc).is_none()) {
                    return None;
                }

                let mut total = 0.0;
                for clause in must {
                    total += clause.score(doc)?;
                }

                let mut should_hits = 0;
                for clause in should {
                    if let Some(score) = clause.score(doc) {
                        should_hits += 1;
                        total += score;
                    }
                }
                if should_hits < *minimum_should_match {
                    return None;
                }

                Some(if must.is_empty() && should.is_empty() {
                    1.0
                } else {
                    total
                })
            }
        }
    }
}

fn dates_equal(stored: &str, query: &str) -> bool {
    match (
        NaiveDate::parse_from_str(stored, DATE_FORMAT),
        NaiveDate::parse_from_str(query, DATE_FORMAT),
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Why the index would reject this document, if it would.
fn rejection_cause(document: &PersonDocument, fields: &FieldTypeMap) -> Option<String> {
    for (name, kind) in fields.iter() {
        if kind != FieldKind::Date {
            continue;
        }
        let Some(field) = PersonField::from_index_name(name) else {
            continue;
        };
        if let Some(value) = document.field(field) {
            if NaiveDate::parse_from_str(value, DATE_FORMAT).is_err() {
                return Some(format!(
                    "document_parsing_exception: failed to parse field [{}] of type [date] with value [{}]",
                    name, value
                ));
            }
        }
    }
    None
}

fn index_not_found(index: &IndexName) -> GatewayError {
    GatewayError::Query(format!(
        "index_not_found_exception: no such index [{}]",
        index
    ))
}

/// Search index held entirely in memory.
///
/// Implements [`SearchIndexGateway`] so it can stand in for the REST engine
/// in tests, benchmarks and dry runs.
#[derive(Default)]
pub struct InMemorySearchIndex {
    indices: RwLock<HashMap<IndexName, StoredIndex>>,
}

impl InMemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in an index, if it exists.
    pub async fn document_count(&self, index: &IndexName) -> Option<usize> {
        self.indices
            .read()
            .await
            .get(index)
            .map(|stored| stored.documents.len())
    }

    /// Field typing the index was created with.
    pub async fn field_types(&self, index: &IndexName) -> Option<FieldTypeMap> {
        self.indices
            .read()
            .await
            .get(index)
            .map(|stored| stored.fields.clone())
    }
}

#[async_trait]
impl SearchIndexGateway for InMemorySearchIndex {
    async fn index_exists(&self, index: &IndexName) -> GatewayResult<bool> {
        Ok(self.indices.read().await.contains_key(index))
    }

    async fn delete_index(&self, index: &IndexName) -> GatewayResult<()> {
        self.indices.write().await.remove(index);
        Ok(())
    }

    async fn create_index(&self, index: &IndexName, fields: &FieldTypeMap) -> GatewayResult<()> {
        let mut indices = self.indices.write().await;
        if indices.contains_key(index) {
            return Err(GatewayError::IndexCreation(format!(
                "resource_already_exists_exception: index [{}] already exists",
                index
            )));
        }
        indices.insert(
            index.clone(),
            StoredIndex {
                fields: fields.clone(),
                documents: Vec::new(),
                next_id: 0,
            },
        );
        Ok(())
    }

    async fn bulk_write(
        &self,
        index: &IndexName,
        documents: Vec<PersonDocument>,
    ) -> GatewayResult<BulkResult> {
        let mut indices = self.indices.write().await;
        let stored = indices.get_mut(index).ok_or_else(|| index_not_found(index))?;

        let mut result = BulkResult::default();
        for document in documents {
            match rejection_cause(&document, &stored.fields) {
                Some(cause) => result.failed.push(BulkFailure { document, cause }),
                None => {
                    stored.next_id += 1;
                    stored.documents.push((stored.next_id.to_string(), document));
                    result.succeeded += 1;
                }
            }
        }
        Ok(result)
    }

    async fn refresh(&self, index: &IndexName) -> GatewayResult<()> {
        if self.indices.read().await.contains_key(index) {
            Ok(())
        } else {
            Err(index_not_found(index))
        }
    }

    async fn search(&self, index: &IndexName, body: &Value) -> GatewayResult<Value> {
        let started = Instant::now();
        let indices = self.indices.read().await;
        let stored = indices.get(index).ok_or_else(|| index_not_found(index))?;

        let clause = match body.get("query") {
            Some(query) => compile(query, &stored.fields)?,
            None => Clause::MatchAll,
        };
        let size = match body.get("size") {
            Some(v) => v
                .as_u64()
                .ok_or_else(|| parsing_error("[size] must be a non-negative number"))?
                as usize,
            None => DEFAULT_SIZE,
        };
        let exact_total = body
            .get("track_total_hits")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let mut matches: Vec<(f64, &str, &PersonDocument)> = stored
            .documents
            .iter()
            .filter_map(|(id, doc)| clause.score(doc).map(|score| (score, id.as_str(), doc)))
            .collect();
        // Stable sort keeps insertion order among equal scores.
        matches.sort_by(|a, b| b.0.total_cmp(&a.0));

        let total = matches.len() as u64;
        let (total_value, relation) = if exact_total || total <= DEFAULT_TRACK_TOTAL_HITS {
            (total, "eq")
        } else {
            (DEFAULT_TRACK_TOTAL_HITS, "gte")
        };

        let hits = matches
            .iter()
            .take(size)
            .map(|(score, id, doc)| -> GatewayResult<Value> {
                Ok(json!({
                    "_index": index.as_str(),
                    "_id": id,
                    "_score": score,
                    "_source": serde_json::to_value(doc)?
                }))
            })
            .collect::<GatewayResult<Vec<Value>>>()?;

        let mut hits_object = Map::new();
        hits_object.insert(
            "total".to_string(),
            json!({ "value": total_value, "relation": relation }),
        );
        hits_object.insert(
            "max_score".to_string(),
            matches.first().map(|m| json!(m.0)).unwrap_or(Value::Null),
        );
        hits_object.insert("hits".to_string(), Value::Array(hits));

        Ok(json!({
            "took": started.elapsed().as_millis() as u64,
            "timed_out": false,
            "hits": Value::Object(hits_object)
        }))
    }
}
