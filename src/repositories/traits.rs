use crate::domain::{IndexName, TableDescriptor};
use crate::error::GatewayResult;
use crate::models::*;
use async_trait::async_trait;

/// Narrow read access to the relational row store.
///
/// Implementations are side-effect free. Transport failures surface as
/// `GatewayError::Connection`, rejected statements as `GatewayError::Query`.
#[async_trait]
pub trait RowStoreGateway: Send + Sync {
    /// Number of rows in the table.
    async fn count(&self, table: &TableDescriptor) -> GatewayResult<u64>;

    /// One page of rows ordered by `order_key`.
    ///
    /// Repeated calls with the same offset and limit return the same rows for
    /// as long as the table is not modified.
    async fn fetch_page(
        &self,
        table: &TableDescriptor,
        order_key: PersonField,
        offset: u64,
        limit: usize,
    ) -> GatewayResult<Vec<PersonRecord>>;

    /// Rows matching an exact first/last name and a preferred-name `LIKE` pattern.
    async fn lookup(
        &self,
        table: &TableDescriptor,
        lookup: &PersonLookup,
    ) -> GatewayResult<Vec<PersonRecord>>;
}

/// Index lifecycle, bulk write, and query access to the search index.
#[async_trait]
pub trait SearchIndexGateway: Send + Sync {
    /// Whether the index exists.
    async fn index_exists(&self, index: &IndexName) -> GatewayResult<bool>;

    /// Delete the index. Deleting a missing index succeeds.
    async fn delete_index(&self, index: &IndexName) -> GatewayResult<()>;

    /// Create the index with the given field typing.
    ///
    /// Fails with `GatewayError::IndexCreation` if the index already exists.
    async fn create_index(&self, index: &IndexName, fields: &FieldTypeMap) -> GatewayResult<()>;

    /// Index a batch of documents.
    ///
    /// Rejected documents are reported in the returned `BulkResult`; only a
    /// failure of the call as a whole is an error.
    async fn bulk_write(
        &self,
        index: &IndexName,
        documents: Vec<PersonDocument>,
    ) -> GatewayResult<BulkResult>;

    /// Make previously written documents visible to searches.
    async fn refresh(&self, _index: &IndexName) -> GatewayResult<()> {
        Ok(())
    }

    /// Run a search request body and return the raw response body.
    async fn search(
        &self,
        index: &IndexName,
        body: &serde_json::Value,
    ) -> GatewayResult<serde_json::Value>;
}
