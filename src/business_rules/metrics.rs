// Performance Metrics for the rental engines
//
// Tracks how often the hot paths run, how long they take on average,
// and how many of them crossed the slow-operation threshold.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use utoipa::ToSchema;

/// Performance threshold for slow operations (100ms)
const SLOW_OPERATION_THRESHOLD_MS: u64 = 100;

/// Kind of operation being timed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    Availability,
    FeeCalculation,
    Search,
    Recommendation,
}

impl OperationType {
    fn index(self) -> usize {
        match self {
            OperationType::Availability => 0,
            OperationType::FeeCalculation => 1,
            OperationType::Search => 2,
            OperationType::Recommendation => 3,
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationType::Availability => write!(f, "availability check"),
            OperationType::FeeCalculation => write!(f, "fee calculation"),
            OperationType::Search => write!(f, "search"),
            OperationType::Recommendation => write!(f, "recommendation"),
        }
    }
}

#[derive(Debug, Default)]
struct OperationCounters {
    count: AtomicU64,
    total_time_us: AtomicU64,
    slow: AtomicU64,
}

impl OperationCounters {
    fn snapshot(&self) -> OperationStats {
        let count = self.count.load(Ordering::Relaxed);
        let total_us = self.total_time_us.load(Ordering::Relaxed);

        OperationStats {
            count,
            avg_time_ms: if count == 0 {
                0.0
            } else {
                (total_us as f64 / count as f64) / 1000.0
            },
            slow: self.slow.load(Ordering::Relaxed),
        }
    }
}

/// Performance metrics shared by every clone
#[derive(Debug, Clone, Default)]
pub struct PerformanceMetrics {
    inner: Arc<[OperationCounters; 4]>,
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing an operation; the duration is recorded when the timer drops
    pub fn start(&self, operation: OperationType) -> OperationTimer {
        OperationTimer {
            start: Instant::now(),
            operation,
            metrics: self.clone(),
        }
    }

    fn record(&self, operation: OperationType, duration: Duration) {
        let counters = &self.inner[operation.index()];
        counters.count.fetch_add(1, Ordering::Relaxed);
        counters
            .total_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);

        if duration.as_millis() as u64 > SLOW_OPERATION_THRESHOLD_MS {
            counters.slow.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("Slow {}: {}ms", operation, duration.as_millis());
        }
    }

    pub fn stats(&self, operation: OperationType) -> OperationStats {
        self.inner[operation.index()].snapshot()
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            availability: self.stats(OperationType::Availability),
            fee_calculation: self.stats(OperationType::FeeCalculation),
            search: self.stats(OperationType::Search),
            recommendation: self.stats(OperationType::Recommendation),
        }
    }

    pub fn log_summary(&self) {
        let summary = self.summary();
        tracing::info!(
            "Rental engine metrics:\n\
             Availability: {} checks, avg {:.2}ms, {} slow\n\
             Fees: {} calculations, avg {:.2}ms, {} slow\n\
             Search: {} queries, avg {:.2}ms, {} slow\n\
             Recommendations: {} requests, avg {:.2}ms, {} slow",
            summary.availability.count,
            summary.availability.avg_time_ms,
            summary.availability.slow,
            summary.fee_calculation.count,
            summary.fee_calculation.avg_time_ms,
            summary.fee_calculation.slow,
            summary.search.count,
            summary.search.avg_time_ms,
            summary.search.slow,
            summary.recommendation.count,
            summary.recommendation.avg_time_ms,
            summary.recommendation.slow,
        );
    }
}

/// Drop guard that records the elapsed time of one operation
pub struct OperationTimer {
    start: Instant,
    operation: OperationType,
    metrics: PerformanceMetrics,
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        self.metrics.record(self.operation, self.start.elapsed());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct OperationStats {
    pub count: u64,
    pub avg_time_ms: f64,
    pub slow: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MetricsSummary {
    pub availability: OperationStats,
    pub fee_calculation: OperationStats,
    pub search: OperationStats,
    pub recommendation: OperationStats,
}
