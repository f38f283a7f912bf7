use serde_json::Value;
use std::sync::Arc;

use super::builder::QueryBody;
use crate::domain::IndexName;
use crate::error::{GatewayError, SearchResult};
use crate::models::{PersonDocument, ResultSet};
use crate::repositories::SearchIndexGateway;

/// Runs built queries against one index and normalizes the response.
///
/// Stateless apart from its gateway handle, so one executor can serve any
/// number of concurrent searches. Failures are returned as-is; retrying is
/// left to the caller.
#[derive(Clone)]
pub struct SearchExecutor {
    gateway: Arc<dyn SearchIndexGateway>,
    index: IndexName,
}

impl SearchExecutor {
    pub fn new(gateway: Arc<dyn SearchIndexGateway>, index: IndexName) -> Self {
        Self { gateway, index }
    }

    pub fn index(&self) -> &IndexName {
        &self.index
    }

    /// Execute `query`, materializing at most `max_results` documents.
    ///
    /// `total_matches` always reports the full match count.
    pub async fn execute(&self, query: &QueryBody, max_results: usize) -> SearchResult<ResultSet> {
        tracing::debug!("Searching {} (max {}): {}", self.index, max_results, query);

        let response = self
            .gateway
            .search(&self.index, &query.with_size(max_results))
            .await?;
        let mut result = parse_response(&response)?;
        result.documents.truncate(max_results);

        tracing::debug!(
            "Search on {} matched {} documents, returned {}",
            self.index,
            result.total_matches,
            result.documents.len()
        );
        Ok(result)
    }
}

/// Normalize a search response into a [`ResultSet`].
///
/// `hits.total` may be a bare number or `{"value": n}` depending on the
/// engine version.
pub fn parse_response(response: &Value) -> Result<ResultSet, GatewayError> {
    let hits = response
        .get("hits")
        .ok_or_else(|| GatewayError::Query("search response has no hits".to_string()))?;

    let total_matches = match hits.get("total") {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::Object(total)) => total.get("value").and_then(Value::as_u64),
        _ => None,
    }
    .ok_or_else(|| GatewayError::Query("search response has no hit total".to_string()))?;

    let documents = hits
        .get("hits")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|hit| hit.get("_source"))
                .map(|source| serde_json::from_value::<PersonDocument>(source.clone()))
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?
        .unwrap_or_default();

    Ok(ResultSet {
        total_matches,
        documents,
    })
}
