//! Retry policies for transient backend failures.

pub mod retry;

pub use retry::{retry, RetryConfig, Retryable};
