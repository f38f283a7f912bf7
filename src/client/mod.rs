//! HTTP client for the search engine's REST API.
//!
//! This module provides a synchronous HTTP client that can be used from async contexts
//! via `tokio::task::spawn_blocking`. The client handles authentication, error mapping,
//! and the newline-delimited bulk protocol.

mod async_wrapper;
pub use async_wrapper::{AsyncSearchClient, AsyncSearchClientImpl};

use crate::config::Config;
use crate::domain::IndexName;
use crate::error::{GatewayError, GatewayResult};
use crate::metrics::{HttpTimer, Metrics};
use crate::models::{BulkFailure, BulkResult, FieldTypeMap, PersonDocument};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Response body of a bulk request.
#[derive(Debug, Deserialize)]
pub struct BulkResponse {
    /// Whether any item failed
    #[serde(default)]
    pub errors: bool,

    /// One entry per action line, in request order
    #[serde(default)]
    pub items: Vec<BulkItem>,
}

/// One bulk item, keyed by its action name.
#[derive(Debug, Deserialize)]
pub struct BulkItem {
    #[serde(alias = "create")]
    pub index: BulkItemStatus,
}

/// Outcome of one bulk action.
#[derive(Debug, Deserialize)]
pub struct BulkItemStatus {
    pub status: u16,

    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl BulkItemStatus {
    /// The failure cause, if this item was rejected.
    pub fn failure_cause(&self) -> Option<String> {
        match &self.error {
            Some(error) => Some(describe_error(error)),
            None if self.status >= 300 => Some(format!("HTTP status {}", self.status)),
            None => None,
        }
    }
}

/// HTTP client for the search engine.
///
/// This client uses `ureq` for synchronous HTTP requests and can be called
/// from async contexts using `tokio::task::spawn_blocking`.
#[derive(Clone)]
pub struct SearchClient {
    /// Base URL of the search engine
    base_url: String,

    /// Optional API key for authentication
    api_key: Option<String>,

    /// HTTP client agent
    agent: Arc<ureq::Agent>,

    /// Metrics collector
    metrics: Metrics,
}

impl SearchClient {
    /// Create a new SearchClient from configuration.
    pub fn new(config: &Config) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.request_timeout))
            .build();

        Self {
            base_url: config.search_url.clone(),
            api_key: config.search_api_key.clone(),
            agent: Arc::new(agent),
            metrics: Metrics::new(),
        }
    }

    /// Create a SearchClient with a custom base URL (useful for testing).
    #[doc(hidden)]
    pub fn with_base_url(base_url: String, api_key: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(10))
            .build();

        Self {
            base_url,
            api_key,
            agent: Arc::new(agent),
            metrics: Metrics::new(),
        }
    }

    /// Get a reference to the metrics collector.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Build a full URL from a path.
    fn build_url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Path of an index endpoint, with the index name percent-encoded.
    fn index_path(index: &IndexName, endpoint: Option<&str>) -> String {
        let name = urlencoding::encode(index.as_str());
        match endpoint {
            Some(endpoint) => format!("{}/{}", name, endpoint),
            None => name.into_owned(),
        }
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let url = self.build_url(path);
        tracing::debug!("{} {}", method, url);

        let request = self.agent.request(method, &url);
        match &self.api_key {
            Some(key) => request.set("Authorization", &format!("ApiKey {}", key)),
            None => request,
        }
    }

    /// Run a request, recording its duration. A 404 is not counted as an error
    /// because HEAD and DELETE treat it as a regular answer.
    fn send(
        &self,
        method: &str,
        path: &str,
        body: Option<(&str, String)>,
    ) -> Result<ureq::Response, ureq::Error> {
        let timer = HttpTimer::new(self.metrics.clone());
        let request = self.request(method, path);

        let result = match body {
            Some((content_type, body)) => request
                .set("Content-Type", content_type)
                .send_string(&body),
            None => request.call(),
        };

        match &result {
            Ok(_) | Err(ureq::Error::Status(404, _)) => timer.complete(),
            Err(e) => {
                tracing::error!("{} {} - Error: {}", method, path, e);
                timer.complete_with_error();
            }
        }

        result
    }

    fn send_json(
        &self,
        method: &str,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<ureq::Response, ureq::Error> {
        self.send(
            method,
            path,
            Some(("application/json", body.to_string())),
        )
    }

    /// Map a ureq error to a GatewayError.
    fn map_error(&self, error: ureq::Error) -> GatewayError {
        match error {
            ureq::Error::Status(code, response) => {
                let body = response
                    .into_string()
                    .unwrap_or_else(|_| "Unknown error".to_string());
                let message = error_reason(&body);

                match code {
                    429 | 502 | 503 | 504 => {
                        GatewayError::Connection(format!("HTTP {}: {}", code, message))
                    }
                    400 if body.contains("resource_already_exists_exception") => {
                        GatewayError::IndexCreation(message)
                    }
                    _ => GatewayError::Query(format!("HTTP {}: {}", code, message)),
                }
            }
            ureq::Error::Transport(transport) => {
                if transport.kind() == ureq::ErrorKind::ConnectionFailed {
                    GatewayError::Connection("Connection failed".to_string())
                } else if transport.kind() == ureq::ErrorKind::Io {
                    GatewayError::Connection("Request timed out".to_string())
                } else {
                    GatewayError::Connection(transport.to_string())
                }
            }
        }
    }

    fn read_json(response: ureq::Response) -> GatewayResult<serde_json::Value> {
        let body = response
            .into_string()
            .map_err(|e| GatewayError::Connection(e.to_string()))?;
        Ok(serde_json::from_str(&body)?)
    }

    // ========================= Index Lifecycle =========================

    /// Whether the index exists.
    pub fn index_exists(&self, index: &IndexName) -> GatewayResult<bool> {
        match self.send("HEAD", &Self::index_path(index, None), None) {
            Ok(_) => Ok(true),
            Err(ureq::Error::Status(404, _)) => Ok(false),
            Err(e) => Err(self.map_error(e)),
        }
    }

    /// Delete the index; a missing index is not an error.
    pub fn delete_index(&self, index: &IndexName) -> GatewayResult<()> {
        match self.send("DELETE", &Self::index_path(index, None), None) {
            Ok(_) | Err(ureq::Error::Status(404, _)) => Ok(()),
            Err(e) => Err(self.map_error(e)),
        }
    }

    /// Create the index with explicit field mappings.
    pub fn create_index(&self, index: &IndexName, fields: &FieldTypeMap) -> GatewayResult<()> {
        self.send_json("PUT", &Self::index_path(index, None), &fields.to_mapping_body())
            .map_err(|e| self.map_error(e))?;
        Ok(())
    }

    /// Make written documents visible to searches.
    pub fn refresh_index(&self, index: &IndexName) -> GatewayResult<()> {
        let path = Self::index_path(index, Some("_refresh"));
        self.send("POST", &path, None)
            .map_err(|e| self.map_error(e))?;
        Ok(())
    }

    // ========================= Documents =========================

    /// Submit documents in one bulk request.
    ///
    /// Documents carry no `_id`, so the engine assigns one per write. Item
    /// outcomes are matched to documents by position.
    pub fn bulk_index(
        &self,
        index: &IndexName,
        documents: Vec<PersonDocument>,
    ) -> GatewayResult<BulkResult> {
        if documents.is_empty() {
            return Ok(BulkResult::default());
        }

        let mut payload = String::new();
        for document in &documents {
            payload.push_str("{\"index\":{}}\n");
            payload.push_str(&serde_json::to_string(document)?);
            payload.push('\n');
        }

        let path = Self::index_path(index, Some("_bulk"));
        let response = self
            .send("POST", &path, Some(("application/x-ndjson", payload)))
            .map_err(|e| self.map_error(e))?;
        let body = response
            .into_string()
            .map_err(|e| GatewayError::Connection(e.to_string()))?;
        let bulk: BulkResponse = serde_json::from_str(&body)?;

        if bulk.items.len() != documents.len() {
            return Err(GatewayError::Query(format!(
                "Bulk response has {} items for {} documents",
                bulk.items.len(),
                documents.len()
            )));
        }

        let mut result = BulkResult::default();
        for (document, item) in documents.into_iter().zip(bulk.items) {
            match item.index.failure_cause() {
                Some(cause) => result.failed.push(BulkFailure { document, cause }),
                None => result.succeeded += 1,
            }
        }

        if bulk.errors && !result.has_failures() {
            tracing::warn!("Bulk response flagged errors but no item failed");
        }

        self.metrics
            .record_bulk_outcome(result.succeeded, result.failed_count());
        Ok(result)
    }

    /// Run a search request and return the raw response body.
    pub fn search(
        &self,
        index: &IndexName,
        body: &serde_json::Value,
    ) -> GatewayResult<serde_json::Value> {
        let path = Self::index_path(index, Some("_search"));
        let response = self
            .send_json("POST", &path, body)
            .map_err(|e| self.map_error(e))?;
        self.metrics.record_search();
        Self::read_json(response)
    }
}

/// `type: reason` from an engine error object, or the raw value.
fn describe_error(error: &serde_json::Value) -> String {
    let kind = error.get("type").and_then(|v| v.as_str());
    let reason = error.get("reason").and_then(|v| v.as_str());
    match (kind, reason) {
        (Some(kind), Some(reason)) => format!("{}: {}", kind, reason),
        (Some(kind), None) => kind.to_string(),
        (None, Some(reason)) => reason.to_string(),
        (None, None) => error.to_string(),
    }
}

/// Human-readable reason from an error response body.
fn error_reason(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("error").map(describe_error))
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_url() {
        let client = SearchClient::with_base_url("http://localhost:9200".to_string(), None);

        assert_eq!(
            client.build_url("/person_index/_bulk"),
            "http://localhost:9200/person_index/_bulk"
        );

        let client_with_slash =
            SearchClient::with_base_url("http://localhost:9200/".to_string(), None);

        assert_eq!(
            client_with_slash.build_url("person_index"),
            "http://localhost:9200/person_index"
        );
    }

    #[test]
    fn test_index_path() {
        let index = IndexName::new("person_index").unwrap();
        assert_eq!(SearchClient::index_path(&index, None), "person_index");
        assert_eq!(
            SearchClient::index_path(&index, Some("_bulk")),
            "person_index/_bulk"
        );
    }

    #[test]
    fn test_client_creation() {
        let config = Config {
            search_url: "https://search.internal:9200".to_string(),
            search_api_key: Some("key-123".to_string()),
            ..Config::default()
        };

        let client = SearchClient::new(&config);
        assert_eq!(client.base_url, "https://search.internal:9200");
        assert_eq!(client.api_key.as_deref(), Some("key-123"));
    }

    #[test]
    fn test_error_reason_from_engine_body() {
        let body = json!({
            "error": { "type": "parsing_exception", "reason": "unknown query [matc]" },
            "status": 400
        })
        .to_string();
        assert_eq!(error_reason(&body), "parsing_exception: unknown query [matc]");
        assert_eq!(error_reason("gateway down"), "gateway down");
    }

    #[test]
    fn test_bulk_item_failure_cause() {
        let ok: BulkItem = serde_json::from_value(json!({ "index": { "status": 201 } })).unwrap();
        assert_eq!(ok.index.failure_cause(), None);

        let rejected: BulkItem = serde_json::from_value(json!({
            "index": {
                "status": 400,
                "error": { "type": "document_parsing_exception", "reason": "failed to parse field [DOB]" }
            }
        }))
        .unwrap();
        assert_eq!(
            rejected.index.failure_cause().as_deref(),
            Some("document_parsing_exception: failed to parse field [DOB]")
        );
    }
}
