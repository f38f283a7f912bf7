//! Error types for the person search sync crate.
//!
//! This module defines custom error types using `thiserror` for precise error handling.
//! Partial bulk-write failures are deliberately absent here: they are reported through
//! [`crate::models::BulkResult`] and never escalate to an error.

use crate::sync::SyncSummary;
use thiserror::Error;

/// Errors raised by the row store and search index gateways.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Backend unreachable, timed out, or temporarily unavailable
    #[error("Connection error: {0}")]
    Connection(String),

    /// The backend rejected the request as malformed
    #[error("Query error: {0}")]
    Query(String),

    /// A fresh index was required but one already exists
    #[error("Index creation error: {0}")]
    IndexCreation(String),

    /// Failed to encode or decode a JSON payload
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GatewayError {
    /// Whether a batch-level retry can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Connection(_))
    }
}

/// Errors that can occur while building or executing a search.
#[derive(Error, Debug)]
pub enum SearchError {
    /// A required parameter was empty or out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The gateway failed to execute the query
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Errors that end a sync pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Batch size must be at least one
    #[error("Batch size must be at least 1")]
    InvalidBatchSize,

    /// Another rebuild currently owns the target index
    #[error("A rebuild of index '{0}' is already running")]
    AlreadyRunning(String),

    /// Index reset or record count failed before any batch was attempted
    #[error("Pipeline setup failed during {stage}: {source}")]
    Setup {
        stage: &'static str,
        #[source]
        source: GatewayError,
    },

    /// A batch failed past its retry budget; remaining batches were skipped
    #[error("Pipeline aborted after {} batches: {source}", .summary.batches_attempted)]
    Aborted {
        summary: Box<SyncSummary>,
        #[source]
        source: GatewayError,
    },
}

impl PipelineError {
    /// The run summary, if batches were attempted before the failure.
    pub fn summary(&self) -> Option<&SyncSummary> {
        match self {
            PipelineError::Aborted { summary, .. } => Some(summary),
            _ => None,
        }
    }
}

/// Errors that can occur while running the performance harness.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// Iteration count or lookup predicate is unusable
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// One of the backends failed during measurement
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required environment variable is missing
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    /// Environment variable has invalid value
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

/// Convenience type alias for Results with GatewayError
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Convenience type alias for Results with SearchError
pub type SearchResult<T> = Result<T, SearchError>;

/// Convenience type alias for Results with PipelineError
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Convenience type alias for Results with HarnessError
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Convenience type alias for Results with ConfigError
pub type ConfigResult<T> = Result<T, ConfigError>;
