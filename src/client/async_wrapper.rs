//! Async wrapper around the synchronous SearchClient.
//!
//! This module provides an async interface to the synchronous SearchClient by using
//! `tokio::task::spawn_blocking` to run HTTP operations on a dedicated thread pool,
//! preventing blocking of the async runtime.

use crate::client::SearchClient;
use crate::domain::IndexName;
use crate::error::{GatewayError, GatewayResult};
use crate::metrics::Metrics;
use crate::models::*;
use async_trait::async_trait;
use std::sync::Arc;

/// Async wrapper trait for search engine operations.
///
/// This trait provides async versions of the SearchClient methods,
/// internally using `tokio::task::spawn_blocking` to avoid
/// blocking the async runtime with synchronous HTTP calls.
#[async_trait]
pub trait AsyncSearchClient: Send + Sync {
    async fn index_exists(&self, index: &IndexName) -> GatewayResult<bool>;
    async fn delete_index(&self, index: &IndexName) -> GatewayResult<()>;
    async fn create_index(&self, index: &IndexName, fields: &FieldTypeMap) -> GatewayResult<()>;
    async fn refresh_index(&self, index: &IndexName) -> GatewayResult<()>;

    async fn bulk_index(
        &self,
        index: &IndexName,
        documents: Vec<PersonDocument>,
    ) -> GatewayResult<BulkResult>;

    async fn search(
        &self,
        index: &IndexName,
        body: &serde_json::Value,
    ) -> GatewayResult<serde_json::Value>;

    fn metrics(&self) -> Metrics;
}

/// Async wrapper around synchronous SearchClient.
#[derive(Clone)]
pub struct AsyncSearchClientImpl {
    client: Arc<SearchClient>,
}

impl AsyncSearchClientImpl {
    pub fn new(client: SearchClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

fn join_error(e: tokio::task::JoinError) -> GatewayError {
    GatewayError::Connection(format!("Task join error: {}", e))
}

#[async_trait]
impl AsyncSearchClient for AsyncSearchClientImpl {
    async fn index_exists(&self, index: &IndexName) -> GatewayResult<bool> {
        let client = self.client.clone();
        let index = index.clone();

        tokio::task::spawn_blocking(move || client.index_exists(&index))
            .await
            .map_err(join_error)?
    }

    async fn delete_index(&self, index: &IndexName) -> GatewayResult<()> {
        let client = self.client.clone();
        let index = index.clone();

        tokio::task::spawn_blocking(move || client.delete_index(&index))
            .await
            .map_err(join_error)?
    }

    async fn create_index(&self, index: &IndexName, fields: &FieldTypeMap) -> GatewayResult<()> {
        let client = self.client.clone();
        let index = index.clone();
        let fields = fields.clone();

        tokio::task::spawn_blocking(move || client.create_index(&index, &fields))
            .await
            .map_err(join_error)?
    }

    async fn refresh_index(&self, index: &IndexName) -> GatewayResult<()> {
        let client = self.client.clone();
        let index = index.clone();

        tokio::task::spawn_blocking(move || client.refresh_index(&index))
            .await
            .map_err(join_error)?
    }

    async fn bulk_index(
        &self,
        index: &IndexName,
        documents: Vec<PersonDocument>,
    ) -> GatewayResult<BulkResult> {
        let client = self.client.clone();
        let index = index.clone();

        tokio::task::spawn_blocking(move || client.bulk_index(&index, documents))
            .await
            .map_err(join_error)?
    }

    async fn search(
        &self,
        index: &IndexName,
        body: &serde_json::Value,
    ) -> GatewayResult<serde_json::Value> {
        let client = self.client.clone();
        let index = index.clone();
        let body = body.clone();

        tokio::task::spawn_blocking(move || client.search(&index, &body))
            .await
            .map_err(join_error)?
    }

    fn metrics(&self) -> Metrics {
        self.client.metrics().clone()
    }
}
