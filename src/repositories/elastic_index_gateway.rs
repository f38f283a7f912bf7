use async_trait::async_trait;
use std::sync::Arc;

use crate::client::AsyncSearchClient;
use crate::domain::IndexName;
use crate::error::GatewayResult;
use crate::models::{BulkResult, FieldTypeMap, PersonDocument};
use crate::repositories::traits::SearchIndexGateway;

/// Search index gateway backed by the engine's REST API.
///
/// This gateway delegates all operations to the AsyncSearchClient,
/// keeping the pipeline and executor independent of HTTP details.
pub struct ElasticIndexGateway {
    client: Arc<dyn AsyncSearchClient>,
}

impl ElasticIndexGateway {
    /// Create a new ElasticIndexGateway with the given client.
    pub fn new(client: Arc<dyn AsyncSearchClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SearchIndexGateway for ElasticIndexGateway {
    async fn index_exists(&self, index: &IndexName) -> GatewayResult<bool> {
        self.client.index_exists(index).await
    }

    async fn delete_index(&self, index: &IndexName) -> GatewayResult<()> {
        self.client.delete_index(index).await
    }

    async fn create_index(&self, index: &IndexName, fields: &FieldTypeMap) -> GatewayResult<()> {
        self.client.create_index(index, fields).await
    }

    async fn bulk_write(
        &self,
        index: &IndexName,
        documents: Vec<PersonDocument>,
    ) -> GatewayResult<BulkResult> {
        self.client.bulk_index(index, documents).await
    }

    async fn refresh(&self, index: &IndexName) -> GatewayResult<()> {
        self.client.refresh_index(index).await
    }

    async fn search(
        &self,
        index: &IndexName,
        body: &serde_json::Value,
    ) -> GatewayResult<serde_json::Value> {
        self.client.search(index, body).await
    }
}
