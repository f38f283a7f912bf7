//! Bulk synchronization from the row store into the search index.

pub mod cancel;
pub mod locks;
pub mod pipeline;

pub use cancel::CancelSignal;
pub use locks::{RebuildGuard, RebuildLocks};
pub use pipeline::{BulkSyncPipeline, SyncOptions, SyncSummary, DEFAULT_BATCH_SIZE};
