use async_trait::async_trait;
use person_search_sync::domain::IndexName;
use person_search_sync::error::{GatewayError, GatewayResult};
use person_search_sync::models::{BulkResult, FieldTypeMap, PersonDocument};
use person_search_sync::repositories::SearchIndexGateway;
use person_search_sync::search::InMemorySearchIndex;
use person_search_sync::sync::CancelSignal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Search index double with injectable bulk-write failures.
///
/// Delegates to an `InMemorySearchIndex` and tracks method calls for
/// verification.
#[allow(dead_code)]
#[derive(Clone)]
pub struct FlakyIndexGateway {
    inner: Arc<InMemorySearchIndex>,
    failing_writes: Arc<Mutex<usize>>,
    always_fail_writes: bool,
    cancel_after_write: Arc<Mutex<Option<CancelSignal>>>,
    call_counts: Arc<Mutex<HashMap<String, usize>>>,
}

#[allow(dead_code)]
impl FlakyIndexGateway {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(InMemorySearchIndex::new()),
            failing_writes: Arc::new(Mutex::new(0)),
            always_fail_writes: false,
            cancel_after_write: Arc::new(Mutex::new(None)),
            call_counts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Every bulk write fails with a transport error.
    pub fn always_failing() -> Self {
        Self {
            always_fail_writes: true,
            ..Self::new()
        }
    }

    /// Fail the next `n` bulk writes with `GatewayError::Connection`.
    pub fn fail_next_writes(&self, n: usize) {
        *self.failing_writes.lock().unwrap() = n;
    }

    /// Trip `signal` once the next bulk write has landed.
    pub fn cancel_after_next_write(&self, signal: CancelSignal) {
        *self.cancel_after_write.lock().unwrap() = Some(signal);
    }

    /// The wrapped index, for inspecting what was written.
    pub fn index(&self) -> &InMemorySearchIndex {
        &self.inner
    }

    /// Get the number of times a method was called.
    pub fn get_call_count(&self, method: &str) -> usize {
        let counts = self.call_counts.lock().unwrap();
        *counts.get(method).unwrap_or(&0)
    }

    fn track_call(&self, method: &str) {
        let mut counts = self.call_counts.lock().unwrap();
        *counts.entry(method.to_string()).or_insert(0) += 1;
    }
}

impl Default for FlakyIndexGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchIndexGateway for FlakyIndexGateway {
    async fn index_exists(&self, index: &IndexName) -> GatewayResult<bool> {
        self.track_call("index_exists");
        self.inner.index_exists(index).await
    }

    async fn delete_index(&self, index: &IndexName) -> GatewayResult<()> {
        self.track_call("delete_index");
        self.inner.delete_index(index).await
    }

    async fn create_index(&self, index: &IndexName, fields: &FieldTypeMap) -> GatewayResult<()> {
        self.track_call("create_index");
        self.inner.create_index(index, fields).await
    }

    async fn bulk_write(
        &self,
        index: &IndexName,
        documents: Vec<PersonDocument>,
    ) -> GatewayResult<BulkResult> {
        self.track_call("bulk_write");

        if self.always_fail_writes {
            return Err(GatewayError::Connection("search engine unavailable".to_string()));
        }
        {
            let mut failing = self.failing_writes.lock().unwrap();
            if *failing > 0 {
                *failing -= 1;
                return Err(GatewayError::Connection("HTTP 503: unavailable".to_string()));
            }
        }

        let result = self.inner.bulk_write(index, documents).await?;
        if let Some(signal) = self.cancel_after_write.lock().unwrap().take() {
            signal.cancel();
        }
        Ok(result)
    }

    async fn refresh(&self, index: &IndexName) -> GatewayResult<()> {
        self.track_call("refresh");
        self.inner.refresh(index).await
    }

    async fn search(
        &self,
        index: &IndexName,
        body: &serde_json::Value,
    ) -> GatewayResult<serde_json::Value> {
        self.track_call("search");
        self.inner.search(index, body).await
    }
}
