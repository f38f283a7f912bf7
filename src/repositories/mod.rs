mod elastic_index_gateway;
mod memory_row_store;
mod sql_row_store;
mod traits;

pub use elastic_index_gateway::ElasticIndexGateway;
pub use memory_row_store::InMemoryRowStore;
pub use sql_row_store::SqlRowStore;
pub use traits::{RowStoreGateway, SearchIndexGateway};
