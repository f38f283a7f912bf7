//! Person Search Sync - bulk synchronization of person records into a search index.
//!
//! This library rebuilds a full-text search index from a relational table in
//! bounded batches, runs typed search intents against that index, and compares
//! lookup latency between the two stores.
//!
//! # Architecture
//!
//! - **models**: Person records, index documents, field typing and result values
//! - **domain**: Validated table and index names
//! - **mapping**: Row to document transformation
//! - **repositories**: Row store and search index gateways with their adapters
//! - **client**: HTTP client for the search engine's REST API
//! - **search**: In-process search index evaluating the same query bodies
//! - **query**: Query builder and executor
//! - **sync**: Bulk rebuild pipeline, cancellation and rebuild locks
//! - **resilience**: Retry with exponential backoff
//! - **harness**: Row store versus index latency comparison
//! - **services**: Invocation surface used by the CLI
//! - **metrics**: Request and document counters
//! - **config**: Configuration management from environment variables
//! - **error**: Custom error types for precise error handling

pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod harness;
pub mod mapping;
pub mod metrics;
pub mod models;
pub mod query;
pub mod repositories;
pub mod resilience;
pub mod search;
pub mod services;
pub mod sync;

pub use client::{AsyncSearchClient, AsyncSearchClientImpl, SearchClient};
pub use config::Config;
pub use domain::{IndexName, TableDescriptor};
pub use error::{ConfigError, GatewayError, HarnessError, PipelineError, SearchError};
pub use harness::{ComparisonReport, LatencyStats, PerformanceHarness};
pub use mapping::DocumentMapper;
pub use metrics::{HttpTimer, Metrics, MetricsSummary};
pub use models::{
    BulkFailure, BulkResult, FieldKind, FieldTypeMap, PersonDocument, PersonField, PersonLookup,
    PersonRecord, ResultSet,
};
pub use query::{QueryBody, QueryBuilder, SearchExecutor, SearchIntent};
pub use repositories::{
    ElasticIndexGateway, InMemoryRowStore, RowStoreGateway, SearchIndexGateway, SqlRowStore,
};
pub use search::InMemorySearchIndex;
pub use services::{PersonSearchService, PersonSearchServiceImpl};
pub use sync::{BulkSyncPipeline, CancelSignal, RebuildLocks, SyncOptions, SyncSummary};
