use async_trait::async_trait;
use person_search_sync::domain::TableDescriptor;
use person_search_sync::error::{GatewayError, GatewayResult};
use person_search_sync::models::{PersonField, PersonLookup, PersonRecord};
use person_search_sync::repositories::{InMemoryRowStore, RowStoreGateway};
use std::sync::{Arc, Mutex};

/// Row store double that records every page request.
///
/// Wraps an `InMemoryRowStore` and can be told to fail a number of page
/// fetches with a transport error, or to report a row count larger than the
/// rows it actually holds.
#[allow(dead_code)]
#[derive(Clone)]
pub struct RecordingRowStore {
    inner: InMemoryRowStore,
    fetches: Arc<Mutex<Vec<(u64, usize)>>>,
    lookups: Arc<Mutex<usize>>,
    failing_fetches: Arc<Mutex<usize>>,
    count_override: Option<u64>,
}

#[allow(dead_code)]
impl RecordingRowStore {
    pub fn new(table: TableDescriptor, records: Vec<PersonRecord>) -> Self {
        Self {
            inner: InMemoryRowStore::with_table(table, records),
            fetches: Arc::new(Mutex::new(Vec::new())),
            lookups: Arc::new(Mutex::new(0)),
            failing_fetches: Arc::new(Mutex::new(0)),
            count_override: None,
        }
    }

    /// Fail the next `n` page fetches with `GatewayError::Connection`.
    pub fn fail_next_fetches(&self, n: usize) {
        *self.failing_fetches.lock().unwrap() = n;
    }

    /// Report `count` rows regardless of the table contents.
    pub fn with_reported_count(mut self, count: u64) -> Self {
        self.count_override = Some(count);
        self
    }

    /// `(offset, limit)` of every page request, in call order.
    pub fn fetches(&self) -> Vec<(u64, usize)> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn lookup_calls(&self) -> usize {
        *self.lookups.lock().unwrap()
    }
}

#[async_trait]
impl RowStoreGateway for RecordingRowStore {
    async fn count(&self, table: &TableDescriptor) -> GatewayResult<u64> {
        match self.count_override {
            Some(count) => Ok(count),
            None => self.inner.count(table).await,
        }
    }

    async fn fetch_page(
        &self,
        table: &TableDescriptor,
        order_key: PersonField,
        offset: u64,
        limit: usize,
    ) -> GatewayResult<Vec<PersonRecord>> {
        self.fetches.lock().unwrap().push((offset, limit));

        {
            let mut failing = self.failing_fetches.lock().unwrap();
            if *failing > 0 {
                *failing -= 1;
                return Err(GatewayError::Connection("row store unreachable".to_string()));
            }
        }

        self.inner.fetch_page(table, order_key, offset, limit).await
    }

    async fn lookup(
        &self,
        table: &TableDescriptor,
        lookup: &PersonLookup,
    ) -> GatewayResult<Vec<PersonRecord>> {
        *self.lookups.lock().unwrap() += 1;
        self.inner.lookup(table, lookup).await
    }
}
