//! Row-store versus index lookup latency.
//!
//! Each backend gets one untimed warm-up call, then `iterations` timed calls
//! of the same logical predicate. Durations are wall-clock per call.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::domain::{IndexName, TableDescriptor};
use crate::error::{HarnessError, HarnessResult};
use crate::models::PersonLookup;
use crate::query::parse_response;
use crate::repositories::{RowStoreGateway, SearchIndexGateway};

/// Summary of one backend's timed calls.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LatencyStats {
    pub mean: Duration,
    pub min: Duration,
    pub max: Duration,
}

impl LatencyStats {
    /// Statistics over `samples`; all zero when empty.
    pub fn from_samples(samples: &[Duration]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let total: Duration = samples.iter().sum();
        Self {
            mean: total / samples.len() as u32,
            min: samples.iter().copied().min().unwrap_or_default(),
            max: samples.iter().copied().max().unwrap_or_default(),
        }
    }
}

impl fmt::Display for LatencyStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mean {:.3} ms (min {:.3} ms, max {:.3} ms)",
            self.mean.as_secs_f64() * 1000.0,
            self.min.as_secs_f64() * 1000.0,
            self.max.as_secs_f64() * 1000.0
        )
    }
}

/// Comparative latency of the two backends for one lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonReport {
    pub iterations: usize,
    pub row_store: LatencyStats,
    pub index: LatencyStats,
    /// `(row_store.mean - index.mean) / row_store.mean * 100`, or 0 when the
    /// row-store mean is zero
    pub relative_gain_percent: f64,
    /// Rows matched by the last row-store call
    pub row_store_matches: usize,
    /// Total hits reported by the last index call
    pub index_matches: u64,
}

impl ComparisonReport {
    pub fn new(
        iterations: usize,
        row_store: LatencyStats,
        index: LatencyStats,
        row_store_matches: usize,
        index_matches: u64,
    ) -> Self {
        Self {
            iterations,
            row_store,
            index,
            relative_gain_percent: relative_gain(row_store.mean, index.mean),
            row_store_matches,
            index_matches,
        }
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Iterations per backend: {}", self.iterations)?;
        writeln!(
            f,
            "Row store: {} [{} rows]",
            self.row_store, self.row_store_matches
        )?;
        writeln!(f, "Index:     {} [{} hits]", self.index, self.index_matches)?;
        write!(f, "Index is {:.2}% faster", self.relative_gain_percent)
    }
}

/// Percentage by which `index` is faster than `row_store`.
pub fn relative_gain(row_store: Duration, index: Duration) -> f64 {
    let row_store = row_store.as_secs_f64();
    if row_store == 0.0 {
        return 0.0;
    }
    (row_store - index.as_secs_f64()) / row_store * 100.0
}

/// Times equivalent lookups against both backends.
pub struct PerformanceHarness {
    row_store: Arc<dyn RowStoreGateway>,
    index: Arc<dyn SearchIndexGateway>,
    table: TableDescriptor,
    index_name: IndexName,
}

impl PerformanceHarness {
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
        }
    }

    /// Run the comparison.
    pub async fn compare(
        &self,
        lookup: &PersonLookup,
        iterations: usize,
    ) -> HarnessResult<ComparisonReport> {
        if iterations == 0 {
            return Err(HarnessError::InvalidParameter(
                "iterations must be at least 1".to_string(),
            ));
        }
        if let Some(field) = lookup.missing_field() {
            return Err(HarnessError::InvalidParameter(format!(
                "{} is required",
                field
            )));
        }

        // Row store
        self.row_store.lookup(&self.table, lookup).await?;
        let mut row_samples = Vec::with_capacity(iterations);
        let mut row_store_matches = 0;
        for _ in 0..iterations {
            let started = Instant::now();
            let rows = self.row_store.lookup(&self.table, lookup).await?;
            row_samples.push(started.elapsed());
            row_store_matches = rows.len();
        }

        // Index
        let body = lookup.index_query();
        self.index.search(&self.index_name, &body).await?;
        let mut index_samples = Vec::with_capacity(iterations);
        let mut last_response = None;
        for _ in 0..iterations {
            let started = Instant::now();
            let response = self.index.search(&self.index_name, &body).await?;
            index_samples.push(started.elapsed());
            last_response = Some(response);
        }
        let index_matches = match last_response {
            Some(response) => parse_response(&response)?.total_matches,
            None => 0,
        };

        let report = ComparisonReport::new(
            iterations,
            LatencyStats::from_samples(&row_samples),
            LatencyStats::from_samples(&index_samples),
            row_store_matches,
            index_matches,
        );
        tracing::info!(
            "Compared {} iterations: row store {}, index {}, gain {:.2}%",
            iterations,
            report.row_store,
            report.index,
            report.relative_gain_percent
        );
        Ok(report)
    }
}
