//! Periodic metrics reporter
//!
//! Samples the source and pipeline counters at a fixed interval and logs
//! one throughput line per tick. Read rates are computed against the
//! previous sample, so the first tick reports absolute counts only.

use std::time::{Duration, Instant};

use sluice_sources::KafkaSourceMetricsHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::metrics::{PipelineMetricsHandle, PipelineMetricsSnapshot};

/// Default reporting interval
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(30);

/// Periodic reporter for pipeline throughput
///
/// Spawn `run()` as a task; it logs until cancellation.
pub struct MetricsReporter {
    interval: Duration,
    source: KafkaSourceMetricsHandle,
    pipeline: PipelineMetricsHandle,
    previous: Option<Sample>,
}

impl MetricsReporter {
    /// Create a reporter over the given metrics handles
    pub fn new(source: KafkaSourceMetricsHandle, pipeline: PipelineMetricsHandle) -> Self {
        Self {
            interval: DEFAULT_REPORT_INTERVAL,
            source,
            pipeline,
            previous: None,
        }
    }

    /// Override the reporting interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the reporter until cancellation
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "metrics reporter started"
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("metrics reporter shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.report();
                }
            }
        }
    }

    /// Sample and log the counters once
    fn report(&mut self) {
        let current = self.sample();

        let rate = self
            .previous
            .as_ref()
            .and_then(|previous| current.read_rate(previous));
        match rate {
            Some(records_per_sec) => info!(
                records_read = current.records_read,
                records_sent = current.snapshot.records_sent,
                records_dropped = current.snapshot.records_dropped,
                records_errored = current.snapshot.records_errored,
                records_per_sec,
                "pipeline throughput"
            ),
            None => info!(
                records_read = current.records_read,
                records_sent = current.snapshot.records_sent,
                records_dropped = current.snapshot.records_dropped,
                records_errored = current.snapshot.records_errored,
                "pipeline throughput"
            ),
        }

        self.previous = Some(current);
    }

    fn sample(&self) -> Sample {
        Sample {
            at: Instant::now(),
            records_read: self.source.snapshot().records_read,
            snapshot: self.pipeline.snapshot(),
        }
    }
}

/// One collected observation
struct Sample {
    at: Instant,
    records_read: u64,
    snapshot: PipelineMetricsSnapshot,
}

impl Sample {
    /// Records read per second since the previous sample, one decimal
    fn read_rate(&self, previous: &Sample) -> Option<f64> {
        let elapsed = self.at.duration_since(previous.at).as_secs_f64();
        if elapsed <= 0.0 {
            return None;
        }

        let read = self.records_read.saturating_sub(previous.records_read);
        Some((read as f64 / elapsed * 10.0).round() / 10.0)
    }
}
