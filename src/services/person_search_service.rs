//! Person search service layer.
//!
//! The invocation surface for rebuilds, searches and latency comparisons,
//! shared by the CLI and anything else that embeds the crate.

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;

use crate::config::Config;
use crate::domain::{IndexName, TableDescriptor};
use crate::error::{HarnessResult, PipelineResult, SearchResult};
use crate::harness::{ComparisonReport, PerformanceHarness};
use crate::models::{PersonLookup, ResultSet, DEFAULT_MAX_RESULTS};
use crate::query::{QueryBuilder, SearchExecutor, SearchIntent};
use crate::repositories::{RowStoreGateway, SearchIndexGateway};
use crate::sync::{BulkSyncPipeline, CancelSignal, RebuildLocks, SyncOptions, SyncSummary};

/// Person search operations.
#[async_trait]
pub trait PersonSearchService: Send + Sync {
    /// Rebuild `index` from `table` in batches of `batch_size`.
    ///
    /// Fails with `PipelineError::AlreadyRunning` if another rebuild of the
    /// same index is in progress.
    async fn rebuild_index(
        &self,
        table: &TableDescriptor,
        index: &IndexName,
        batch_size: usize,
        cancel: CancelSignal,
    ) -> PipelineResult<SyncSummary>;

    /// Run one search intent against the configured index.
    async fn search(
        &self,
        intent: &SearchIntent,
        max_results: Option<usize>,
    ) -> SearchResult<ResultSet>;

    /// Run several intents concurrently, returning results in input order.
    async fn search_many(
        &self,
        intents: &[SearchIntent],
        max_results: Option<usize>,
    ) -> Vec<SearchResult<ResultSet>>;

    /// Time `lookup` against both backends.
    async fn compare_performance(
        &self,
        lookup: &PersonLookup,
        iterations: usize,
    ) -> HarnessResult<ComparisonReport>;
}

/// Default implementation of PersonSearchService.
pub struct PersonSearchServiceImpl {
    row_store: Arc<dyn RowStoreGateway>,
    index: Arc<dyn SearchIndexGateway>,
    table: TableDescriptor,
    index_name: IndexName,
    options: SyncOptions,
    max_results: usize,
    builder: QueryBuilder,
    locks: RebuildLocks,
}

impl PersonSearchServiceImpl {
    /// Create a service over `table` and `index_name` with default options.
    pub fn new(
        row_store: Arc<dyn RowStoreGateway>,
        index: Arc<dyn SearchIndexGateway>,
        table: TableDescriptor,
        index_name: IndexName,
    ) -> Self {
        Self {
            row_store,
            index,
            table,
            index_name,
            options: SyncOptions::default(),
            max_results: DEFAULT_MAX_RESULTS,
            builder: QueryBuilder::new(),
            locks: RebuildLocks::global(),
        }
    }

    /// Create a service using the table, index and tunables from `config`.
    pub fn from_config(
        row_store: Arc<dyn RowStoreGateway>,
        index: Arc<dyn SearchIndexGateway>,
        config: &Config,
    ) -> Self {
        Self::new(
            row_store,
            index,
            config.person_table.clone(),
            config.search_index.clone(),
        )
        .with_sync_options(config.sync_options())
        .with_max_results(config.search_max_results)
    }

    pub fn with_sync_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Arbitrate rebuilds through `locks` instead of the process-wide registry.
    pub fn with_locks(mut self, locks: RebuildLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn table(&self) -> &TableDescriptor {
        &self.table
    }

    pub fn index_name(&self) -> &IndexName {
        &self.index_name
    }

    fn executor(&self) -> SearchExecutor {
        SearchExecutor::new(self.index.clone(), self.index_name.clone())
    }
}

#[async_trait]
impl PersonSearchService for PersonSearchServiceImpl {
    async fn rebuild_index(
        &self,
        table: &TableDescriptor,
        index: &IndexName,
        batch_size: usize,
        cancel: CancelSignal,
    ) -> PipelineResult<SyncSummary> {
        let _guard = self.locks.try_lock(index)?;

        let options = SyncOptions {
            batch_size,
            ..self.options.clone()
        };
        BulkSyncPipeline::new(self.row_store.clone(), self.index.clone(), options)
            .with_cancel_signal(cancel)
            .run(table, index)
            .await
    }

    async fn search(
        &self,
        intent: &SearchIntent,
        max_results: Option<usize>,
    ) -> SearchResult<ResultSet> {
        let query = self.builder.build(intent)?;
        tracing::debug!("Running {} search", intent.name());
        self.executor()
            .execute(&query, max_results.unwrap_or(self.max_results))
            .await
    }

    async fn search_many(
        &self,
        intents: &[SearchIntent],
        max_results: Option<usize>,
    ) -> Vec<SearchResult<ResultSet>> {
        join_all(intents.iter().map(|intent| self.search(intent, max_results))).await
    }

    async fn compare_performance(
        &self,
        lookup: &PersonLookup,
        iterations: usize,
    ) -> HarnessResult<ComparisonReport> {
        PerformanceHarness::new(
            self.row_store.clone(),
            self.index.clone(),
            self.table.clone(),
            self.index_name.clone(),
        )
        .compare(lookup, iterations)
        .await
    }
}
