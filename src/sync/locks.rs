//! Exclusive rebuild rights per index.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use once_cell::sync::Lazy;

use crate::domain::IndexName;
use crate::error::{PipelineError, PipelineResult};

static GLOBAL_LOCKS: Lazy<RebuildLocks> = Lazy::new(RebuildLocks::new);

/// Registry of indices currently being rebuilt.
///
/// The gateways do not arbitrate concurrent rebuilds, so callers take a guard
/// here for the whole run. Clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct RebuildLocks {
    held: Arc<Mutex<HashSet<IndexName>>>,
}

impl RebuildLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry shared by every service built with defaults.
    pub fn global() -> Self {
        GLOBAL_LOCKS.clone()
    }

    fn held(&self) -> MutexGuard<'_, HashSet<IndexName>> {
        // The set stays consistent even if a holder panicked.
        self.held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Take the rebuild lock for `index`, failing if a run already holds it.
    pub fn try_lock(&self, index: &IndexName) -> PipelineResult<RebuildGuard> {
        if !self.held().insert(index.clone()) {
            return Err(PipelineError::AlreadyRunning(index.to_string()));
        }
        Ok(RebuildGuard {
            locks: self.clone(),
            index: index.clone(),
        })
    }

    pub fn is_locked(&self, index: &IndexName) -> bool {
        self.held().contains(index)
    }
}

/// Releases the rebuild lock when dropped.
#[derive(Debug)]
pub struct RebuildGuard {
    locks: RebuildLocks,
    index: IndexName,
}

impl RebuildGuard {
    pub fn index(&self) -> &IndexName {
        &self.index
    }
}

impl Drop for RebuildGuard {
    fn drop(&mut self) {
        self.locks.held().remove(&self.index);
    }
}
