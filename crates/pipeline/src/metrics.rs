//! Pipeline metrics
//!
//! Atomic counters for the record flow through the worker pool.
//! All operations use relaxed ordering; values may be slightly stale when
//! read but are exact at quiescence.
//!
//! At quiescence every record the source published is accounted for:
//! `records_sent + records_dropped + records_errored` equals the number of
//! records the workers pulled. Records still buffered in the channel when
//! cancellation fires are the one exception; they were read but never
//! reached a worker.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for the dispatcher and its workers
///
/// # Thread Safety
///
/// All methods are safe to call from multiple threads concurrently. The
/// atomic operations ensure no data races, though values may be slightly
/// stale when read.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Records delivered to the sink
    records_sent: AtomicU64,

    /// Records removed by the chain's drop sentinel
    records_dropped: AtomicU64,

    /// Records lost to a decode, processing or delivery failure
    records_errored: AtomicU64,

    /// Records whose payload could not be decoded
    decode_errors: AtomicU64,

    /// Records that failed inside the processor chain
    process_errors: AtomicU64,

    /// Records the sink could not deliver after its retries
    delivery_errors: AtomicU64,

    /// Transient fetch failures reported by the source (not records)
    ingest_errors: AtomicU64,
}

impl PipelineMetrics {
    /// Create new metrics instance with all counters at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            records_sent: AtomicU64::new(0),
            records_dropped: AtomicU64::new(0),
            records_errored: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            process_errors: AtomicU64::new(0),
            delivery_errors: AtomicU64::new(0),
            ingest_errors: AtomicU64::new(0),
        }
    }

    /// Record a successful delivery to the sink
    #[inline]
    pub fn record_sent(&self) {
        self.records_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a chain drop (intentional filtering, not a failure)
    #[inline]
    pub fn record_dropped(&self) {
        self.records_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a record whose payload failed to decode
    #[inline]
    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
        self.records_errored.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a record that failed inside the processor chain
    #[inline]
    pub fn record_process_error(&self) {
        self.process_errors.fetch_add(1, Ordering::Relaxed);
        self.records_errored.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a record the sink could not deliver after its retries
    #[inline]
    pub fn record_delivery_error(&self) {
        self.delivery_errors.fetch_add(1, Ordering::Relaxed);
        self.records_errored.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a transient ingestion failure (no record is lost)
    #[inline]
    pub fn record_ingest_error(&self) {
        self.ingest_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time snapshot
    pub fn snapshot(&self) -> PipelineMetricsSnapshot {
        PipelineMetricsSnapshot {
            records_sent: self.records_sent.load(Ordering::Relaxed),
            records_dropped: self.records_dropped.load(Ordering::Relaxed),
            records_errored: self.records_errored.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            process_errors: self.process_errors.load(Ordering::Relaxed),
            delivery_errors: self.delivery_errors.load(Ordering::Relaxed),
            ingest_errors: self.ingest_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of pipeline metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineMetricsSnapshot {
    /// Records delivered to the sink
    pub records_sent: u64,
    /// Records removed by the chain's drop sentinel
    pub records_dropped: u64,
    /// Records lost to a decode, processing or delivery failure
    pub records_errored: u64,
    /// Records whose payload could not be decoded
    pub decode_errors: u64,
    /// Records that failed inside the processor chain
    pub process_errors: u64,
    /// Records the sink could not deliver after its retries
    pub delivery_errors: u64,
    /// Transient fetch failures reported by the source
    pub ingest_errors: u64,
}

impl PipelineMetricsSnapshot {
    /// Total records accounted for: sent, dropped or errored
    ///
    /// At quiescence this equals the number of records the source
    /// published, minus anything still buffered at cancellation.
    #[inline]
    pub fn records_accounted(&self) -> u64 {
        self.records_sent + self.records_dropped + self.records_errored
    }

    /// Fraction of accounted records that reached the sink (0.0 - 1.0)
    ///
    /// Returns None if no records have been accounted for yet.
    #[inline]
    pub fn success_rate(&self) -> Option<f64> {
        let accounted = self.records_accounted();
        if accounted == 0 {
            None
        } else {
            Some(self.records_sent as f64 / accounted as f64)
        }
    }

    /// Calculate the difference from another snapshot
    ///
    /// Useful for calculating rates over time intervals.
    #[inline]
    pub fn diff(&self, previous: &PipelineMetricsSnapshot) -> PipelineMetricsSnapshot {
        PipelineMetricsSnapshot {
            records_sent: self.records_sent.saturating_sub(previous.records_sent),
            records_dropped: self.records_dropped.saturating_sub(previous.records_dropped),
            records_errored: self.records_errored.saturating_sub(previous.records_errored),
            decode_errors: self.decode_errors.saturating_sub(previous.decode_errors),
            process_errors: self.process_errors.saturating_sub(previous.process_errors),
            delivery_errors: self.delivery_errors.saturating_sub(previous.delivery_errors),
            ingest_errors: self.ingest_errors.saturating_sub(previous.ingest_errors),
        }
    }
}

/// Handle for accessing pipeline metrics
///
/// Holds an Arc to the metrics, so it remains valid after `run()` consumes
/// the dispatcher.
#[derive(Debug, Clone)]
pub struct PipelineMetricsHandle {
    metrics: Arc<PipelineMetrics>,
}

impl PipelineMetricsHandle {
    pub(crate) fn new(metrics: Arc<PipelineMetrics>) -> Self {
        Self { metrics }
    }

    /// Get a point-in-time snapshot
    pub fn snapshot(&self) -> PipelineMetricsSnapshot {
        self.metrics.snapshot()
    }
}
