//! Full index rebuild from the row store.
//!
//! A run deletes and recreates the target index, then walks the table in
//! fixed-size pages ordered by a stable key, mapping each page to documents and
//! submitting it as one bulk write. Pages are fetched and written strictly in
//! offset order with one batch in flight.
//!
//! Per-document rejections are collected in the [`SyncSummary`] and never stop
//! the run. A page fetch or bulk write that keeps failing with a transport
//! error after its retry budget aborts the remaining batches.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use super::cancel::CancelSignal;
use crate::domain::{IndexName, TableDescriptor};
use crate::error::{GatewayError, PipelineError, PipelineResult};
use crate::mapping::DocumentMapper;
use crate::models::{BulkFailure, BulkResult, FieldTypeMap, PersonField};
use crate::repositories::{RowStoreGateway, SearchIndexGateway};
use crate::resilience::{retry, RetryConfig};

/// Rows per page when not configured.
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Tunables for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOptions {
    /// Rows per page and documents per bulk write
    pub batch_size: usize,

    /// Column the pages are ordered by
    pub order_key: PersonField,

    /// Retry policy for transport failures of page fetches and bulk writes
    pub retry: RetryConfig,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            order_key: PersonField::FirstName,
            retry: RetryConfig::default(),
        }
    }
}

impl SyncOptions {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            ..Self::default()
        }
    }

    pub fn with_order_key(mut self, order_key: PersonField) -> Self {
        self.order_key = order_key;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    /// Row count read before the first batch
    pub total_records: u64,
    pub batches_attempted: usize,
    pub documents_succeeded: usize,
    pub documents_failed: usize,
    /// Every rejected document with its cause
    pub failures: Vec<BulkFailure>,
    /// A batch failed past its retry budget and the rest were skipped
    pub fatal_abort: bool,
    /// The run stopped early at a batch boundary on request
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl SyncSummary {
    fn record(&mut self, result: BulkResult) {
        self.documents_succeeded += result.succeeded;
        self.documents_failed += result.failed.len();
        self.failures.extend(result.failed);
    }

    /// Documents submitted so far, accepted or not.
    pub fn documents_processed(&self) -> usize {
        self.documents_succeeded + self.documents_failed
    }

    /// Every row was read and every document accepted.
    pub fn is_clean(&self) -> bool {
        !self.fatal_abort
            && !self.cancelled
            && self.documents_failed == 0
            && self.documents_succeeded as u64 == self.total_records
    }
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "batches attempted: {}, documents succeeded: {}, documents failed: {}, fatal abort: {}",
            self.batches_attempted,
            self.documents_succeeded,
            self.documents_failed,
            if self.fatal_abort { "yes" } else { "no" }
        )?;
        if self.cancelled {
            write!(f, ", cancelled")?;
        }
        Ok(())
    }
}

/// Rebuilds a search index from a row-store table.
pub struct BulkSyncPipeline {
    row_store: Arc<dyn RowStoreGateway>,
    index: Arc<dyn SearchIndexGateway>,
    mapper: DocumentMapper,
    fields: FieldTypeMap,
    options: SyncOptions,
    cancel: CancelSignal,
}

impl BulkSyncPipeline {
    pub fn new(
        row_store: Arc<dyn RowStoreGateway>,
        index: Arc<dyn SearchIndexGateway>,
        options: SyncOptions,
    ) -> Self {
        Self {
            row_store,
            index,
            mapper: DocumentMapper::new(),
            fields: FieldTypeMap::person(),
            options,
            cancel: CancelSignal::new(),
        }
    }

    /// Create the index with a different field typing.
    pub fn with_field_types(mut self, fields: FieldTypeMap) -> Self {
        self.fields = fields;
        self
    }

    /// Stop at the next batch boundary once `signal` is cancelled.
    pub fn with_cancel_signal(mut self, signal: CancelSignal) -> Self {
        self.cancel = signal;
        self
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Rebuild `index_name` from the rows of `table`.
    ///
    /// Completes once every batch has been attempted, even if some documents
    /// were rejected; inspect the summary's failure count to decide whether
    /// to alert.
    pub async fn run(
        &self,
        table: &TableDescriptor,
        index_name: &IndexName,
    ) -> PipelineResult<SyncSummary> {
        let batch_size = self.options.batch_size;
        if batch_size == 0 {
            return Err(PipelineError::InvalidBatchSize);
        }

        let started = Instant::now();
        let mut summary = SyncSummary::default();

        self.reset_index(index_name).await?;

        let total = retry("row_count", &self.options.retry, || self.row_store.count(table))
            .await
            .map_err(|source| PipelineError::Setup {
                stage: "row count",
                source,
            })?;
        summary.total_records = total;
        info!(
            "Syncing {} rows from {} into {} in batches of {}",
            total, table, index_name, batch_size
        );

        let mut offset: u64 = 0;
        while offset < total {
            if self.cancel.is_cancelled() {
                warn!("Sync cancelled at offset {}/{}", offset, total);
                summary.cancelled = true;
                break;
            }

            let limit = (total - offset).min(batch_size as u64) as usize;
            summary.batches_attempted += 1;

            let page = match retry("fetch_page", &self.options.retry, || {
                self.row_store
                    .fetch_page(table, self.options.order_key, offset, limit)
            })
            .await
            {
                Ok(page) => page,
                Err(source) => return Err(self.abort(summary, started, offset, source)),
            };

            if page.is_empty() {
                warn!(
                    "Row store returned no rows at offset {} (expected {}); ending pass",
                    offset, limit
                );
                break;
            }

            let fetched = page.len();
            let documents = self.mapper.to_documents(&page);
            drop(page);

            let result = match retry("bulk_write", &self.options.retry, || {
                self.index.bulk_write(index_name, documents.clone())
            })
            .await
            {
                Ok(result) => result,
                Err(source) => return Err(self.abort(summary, started, offset, source)),
            };

            for failure in &result.failed {
                warn!("Document rejected: {}", failure.cause);
            }
            summary.record(result);
            offset += fetched as u64;

            info!(
                "Batch {}: {}/{} rows processed ({} failed so far)",
                summary.batches_attempted, offset, total, summary.documents_failed
            );

            if fetched < limit {
                warn!(
                    "Short page at offset {}: expected {} rows, got {}; ending pass",
                    offset - fetched as u64,
                    limit,
                    fetched
                );
                break;
            }
        }

        if let Err(e) = self.index.refresh(index_name).await {
            warn!("Refresh of {} failed: {}", index_name, e);
        }

        summary.elapsed = started.elapsed();
        info!("Sync of {} finished in {:?}: {}", index_name, summary.elapsed, summary);
        Ok(summary)
    }

    /// Delete the index if present, then create it with the configured typing.
    async fn reset_index(&self, index_name: &IndexName) -> PipelineResult<()> {
        let setup = |source| PipelineError::Setup {
            stage: "index reset",
            source,
        };

        let exists = retry("index_exists", &self.options.retry, || {
            self.index.index_exists(index_name)
        })
        .await
        .map_err(setup)?;

        if exists {
            info!("Deleting existing index {}", index_name);
            retry("delete_index", &self.options.retry, || {
                self.index.delete_index(index_name)
            })
            .await
            .map_err(setup)?;
        }

        retry("create_index", &self.options.retry, || {
            self.index.create_index(index_name, &self.fields)
        })
        .await
        .map_err(setup)?;
        info!("Created index {} with {} mapped fields", index_name, self.fields.len());
        Ok(())
    }

    fn abort(
        &self,
        mut summary: SyncSummary,
        started: Instant,
        offset: u64,
        source: GatewayError,
    ) -> PipelineError {
        summary.fatal_abort = true;
        summary.elapsed = started.elapsed();
        error!(
            "Sync aborted at offset {}/{} after retries: {} ({})",
            offset, summary.total_records, source, summary
        );
        PipelineError::Aborted {
            summary: Box::new(summary),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PersonRecord;
    use crate::repositories::InMemoryRowStore;
    use crate::search::InMemorySearchIndex;

    fn fixtures(rows: usize) -> (Arc<InMemoryRowStore>, Arc<InMemorySearchIndex>, TableDescriptor) {
        let table = TableDescriptor::new("persons").unwrap();
        let records = (0..rows)
            .map(|i| PersonRecord::named(format!("First{:04}", i), "Last"))
            .collect();
        (
            Arc::new(InMemoryRowStore::with_table(table.clone(), records)),
            Arc::new(InMemorySearchIndex::new()),
            table,
        )
    }

    #[tokio::test]
    async fn test_rebuild_copies_every_row() {
        let (rows, index, table) = fixtures(25);
        let name = IndexName::new("people").unwrap();
        let pipeline = BulkSyncPipeline::new(rows, index.clone(), SyncOptions::new(10));

        let summary = pipeline.run(&table, &name).await.unwrap();
        assert_eq!(summary.batches_attempted, 3);
        assert_eq!(summary.documents_succeeded, 25);
        assert!(summary.is_clean());
        assert_eq!(index.document_count(&name).await, Some(25));
    }

    #[tokio::test]
    async fn test_rebuild_replaces_previous_contents() {
        let (rows, index, table) = fixtures(4);
        let name = IndexName::new("people").unwrap();
        let pipeline = BulkSyncPipeline::new(rows, index.clone(), SyncOptions::new(3));

        pipeline.run(&table, &name).await.unwrap();
        pipeline.run(&table, &name).await.unwrap();
        assert_eq!(index.document_count(&name).await, Some(4));
    }

    #[tokio::test]
    async fn test_zero_batch_size_rejected() {
        let (rows, index, table) = fixtures(1);
        let name = IndexName::new("people").unwrap();
        let pipeline = BulkSyncPipeline::new(rows, index, SyncOptions::new(0));
        assert!(matches!(
            pipeline.run(&table, &name).await,
            Err(PipelineError::InvalidBatchSize)
        ));
    }

    #[tokio::test]
    async fn test_missing_table_fails_setup() {
        let index = Arc::new(InMemorySearchIndex::new());
        let rows = Arc::new(InMemoryRowStore::new());
        let pipeline = BulkSyncPipeline::new(rows, index, SyncOptions::new(10));
        let err = pipeline
            .run(
                &TableDescriptor::new("missing").unwrap(),
                &IndexName::new("people").unwrap(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Setup { stage: "row count", .. }));
    }

    #[test]
    fn test_summary_display() {
        let summary = SyncSummary {
            batches_attempted: 2,
            documents_succeeded: 19,
            documents_failed: 1,
            ..Default::default()
        };
        assert_eq!(
            summary.to_string(),
            "batches attempted: 2, documents succeeded: 19, documents failed: 1, fatal abort: no"
        );
    }
}
