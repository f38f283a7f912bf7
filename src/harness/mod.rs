//! Latency comparison between the row store and the search index.

pub mod performance;

pub use crate::models::PersonLookup;
pub use performance::{relative_gain, ComparisonReport, LatencyStats, PerformanceHarness};
