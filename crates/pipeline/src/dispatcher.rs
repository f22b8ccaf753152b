//! Dispatcher - the worker pool between source and sink
//!
//! Bridges the decoded record stream to N workers, each running one record
//! through the processor chain and then sending it to the sink. A separate
//! loop drains the source's error channel.
//!
//! # Design
//!
//! - **Free-pull**: workers share one receiver and each pulls the next
//!   available record; there is no per-worker queue. With one worker,
//!   per-partition order is preserved end-to-end. With more workers,
//!   completion order is unspecified, in exchange for even load
//!   distribution. Callers that need per-partition order run one worker.
//! - **Deliver-current**: a worker that has already pulled a record
//!   finishes chain and send for it after cancellation fires. Once
//!   cancellation is observed no further records are pulled; whatever the
//!   channel still buffers stays unprocessed.
//! - **Error drain**: a decode failure counts the failed record as
//!   errored; a transient fetch failure is logged without touching the
//!   record counters.
//! - **States**: `Idle → Running → Stopping → Stopped`, readable through a
//!   `DispatcherStateHandle` while `run()` owns the dispatcher.
//!
//! # Example
//!
//! ```ignore
//! use sluice_pipeline::Dispatcher;
//! use tokio::sync::mpsc;
//! use tokio_util::sync::CancellationToken;
//!
//! let (record_tx, record_rx) = mpsc::channel(1000);
//! let (error_tx, error_rx) = mpsc::channel(1000);
//!
//! let dispatcher = Dispatcher::new(record_rx, error_rx, chain, sink, 4);
//! let metrics = dispatcher.metrics_handle();
//!
//! let cancel = CancellationToken::new();
//! tokio::spawn(dispatcher.run(cancel.clone()));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use sluice_processor::Chain;
use sluice_protocol::Record;
use sluice_sinks::Sink;
use sluice_sources::SourceError;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::metrics::{PipelineMetrics, PipelineMetricsHandle};

/// Lifecycle states of the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DispatcherState {
    /// Constructed, workers not yet launched
    Idle = 0,
    /// All workers launched and pulling records
    Running = 1,
    /// Cancellation observed, workers finishing their current record
    Stopping = 2,
    /// Every worker and the error drain have exited
    Stopped = 3,
}

impl DispatcherState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::Stopping,
            _ => Self::Stopped,
        }
    }

    /// State name for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for DispatcherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle for observing the dispatcher state
///
/// Holds an Arc to the state, so it remains valid after `run()` consumes
/// the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherStateHandle {
    state: Arc<AtomicU8>,
}

impl DispatcherStateHandle {
    /// Current state
    pub fn state(&self) -> DispatcherState {
        DispatcherState::from_u8(self.state.load(Ordering::SeqCst))
    }
}

/// Worker pool applying the processor chain and sending to the sink
pub struct Dispatcher {
    /// Decoded records from the source
    record_rx: mpsc::Receiver<Record>,

    /// Ingestion and decode errors from the source
    error_rx: mpsc::Receiver<SourceError>,

    /// Processor chain shared by all workers
    chain: Arc<Chain>,

    /// Delivery target shared by all workers
    sink: Arc<dyn Sink>,

    /// Worker count, already normalized to at least one
    workers: usize,

    /// Flow counters
    metrics: Arc<PipelineMetrics>,

    /// Lifecycle state
    state: Arc<AtomicU8>,
}

impl Dispatcher {
    /// Create a new dispatcher
    ///
    /// A `workers` value of zero is treated as one.
    pub fn new(
        record_rx: mpsc::Receiver<Record>,
        error_rx: mpsc::Receiver<SourceError>,
        chain: Chain,
        sink: Arc<dyn Sink>,
        workers: usize,
    ) -> Self {
        Self {
            record_rx,
            error_rx,
            chain: Arc::new(chain),
            sink,
            workers: workers.max(1),
            metrics: Arc::new(PipelineMetrics::new()),
            state: Arc::new(AtomicU8::new(DispatcherState::Idle as u8)),
        }
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Get a metrics handle that outlives `run()`
    pub fn metrics_handle(&self) -> PipelineMetricsHandle {
        PipelineMetricsHandle::new(Arc::clone(&self.metrics))
    }

    /// Current state
    pub fn state(&self) -> DispatcherState {
        DispatcherState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Get a state handle that outlives `run()`
    pub fn state_handle(&self) -> DispatcherStateHandle {
        DispatcherStateHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Number of workers the pool will run
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Names of the chain's processors in application order
    pub fn processor_names(&self) -> Vec<&'static str> {
        self.chain.names()
    }

    /// Run the worker pool until the record stream ends or cancellation
    /// fires
    ///
    /// Returns once every worker and the error drain have exited. Worker
    /// panics are logged and do not bring down the remaining workers.
    pub async fn run(self, cancel: CancellationToken) {
        let Self {
            record_rx,
            error_rx,
            chain,
            sink,
            workers,
            metrics,
            state,
        } = self;

        let context = WorkerContext {
            rx: Arc::new(Mutex::new(record_rx)),
            chain,
            sink,
            metrics: Arc::clone(&metrics),
            state: Arc::clone(&state),
            cancel: cancel.clone(),
        };

        let mut worker_handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            worker_handles.push(tokio::spawn(worker_loop(worker_id, context.clone())));
        }
        let drain_handle = tokio::spawn(drain_errors(
            error_rx,
            Arc::clone(&metrics),
            Arc::clone(&state),
            cancel,
        ));

        state.store(DispatcherState::Running as u8, Ordering::SeqCst);
        info!(workers, "dispatcher running");

        for (worker_id, handle) in worker_handles.into_iter().enumerate() {
            if let Err(e) = handle.await {
                error!(worker_id, error = %e, "worker task panicked");
            }
        }
        if let Err(e) = drain_handle.await {
            error!(error = %e, "error drain task panicked");
        }

        state.store(DispatcherState::Stopped as u8, Ordering::SeqCst);

        let snapshot = metrics.snapshot();
        info!(
            records_sent = snapshot.records_sent,
            records_dropped = snapshot.records_dropped,
            records_errored = snapshot.records_errored,
            "dispatcher stopped"
        );
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("workers", &self.workers)
            .field("processors", &self.chain.names())
            .field("sink", &self.sink.name())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Shared pieces cloned into every worker task
#[derive(Clone)]
struct WorkerContext {
    rx: Arc<Mutex<mpsc::Receiver<Record>>>,
    chain: Arc<Chain>,
    sink: Arc<dyn Sink>,
    metrics: Arc<PipelineMetrics>,
    state: Arc<AtomicU8>,
    cancel: CancellationToken,
}

async fn worker_loop(worker_id: usize, context: WorkerContext) {
    debug!(worker_id, "worker starting");

    loop {
        // Hold the receiver lock only while waiting. Processing happens
        // after it is released so the other workers can pull concurrently.
        // The biased arm order makes cancellation win over a buffered
        // record, which is what keeps buffered records unprocessed after
        // shutdown begins.
        let next = {
            let mut rx = context.rx.lock().await;
            tokio::select! {
                biased;
                _ = context.cancel.cancelled() => None,
                record = rx.recv() => record,
            }
        };

        let Some(record) = next else {
            break;
        };

        process_record(&context, record).await;
    }

    if context.cancel.is_cancelled() {
        note_stopping(&context.state);
    }
    debug!(worker_id, "worker stopping");
}

/// Run one record through the chain and deliver the result
async fn process_record(context: &WorkerContext, record: Record) {
    // Provenance outlives the record, which the chain consumes on failure.
    let topic = record.topic().to_string();
    let partition = record.partition();
    let offset = record.offset();

    let processed = match context.chain.process(record) {
        Ok(Some(record)) => record,
        Ok(None) => {
            context.metrics.record_dropped();
            debug!(topic = %topic, partition, offset, "record dropped by chain");
            return;
        }
        Err(e) => {
            context.metrics.record_process_error();
            warn!(
                topic = %topic,
                partition,
                offset,
                error = %e,
                "record failed in processor chain"
            );
            return;
        }
    };

    match context.sink.send(processed).await {
        Ok(()) => context.metrics.record_sent(),
        Err(e) => {
            context.metrics.record_delivery_error();
            warn!(
                topic = %topic,
                partition,
                offset,
                error = %e,
                "record lost after delivery retries"
            );
        }
    }
}

/// Consume the source's error channel until it closes or cancellation
/// fires
async fn drain_errors(
    mut error_rx: mpsc::Receiver<SourceError>,
    metrics: Arc<PipelineMetrics>,
    state: Arc<AtomicU8>,
    cancel: CancellationToken,
) {
    debug!("error drain starting");

    loop {
        let error = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            error = error_rx.recv() => match error {
                Some(error) => error,
                None => break,
            },
        };

        match error {
            // Display carries topic/partition/offset provenance
            SourceError::Deserialize { .. } => {
                metrics.record_decode_error();
                warn!(error = %error, "record failed to decode");
            }
            error => {
                metrics.record_ingest_error();
                warn!(error = %error, "ingestion error");
            }
        }
    }

    if cancel.is_cancelled() {
        note_stopping(&state);
    }
    debug!("error drain stopping");
}

/// Flip Running to Stopping; any other state is left alone
fn note_stopping(state: &AtomicU8) {
    let _ = state.compare_exchange(
        DispatcherState::Running as u8,
        DispatcherState::Stopping as u8,
        Ordering::SeqCst,
        Ordering::SeqCst,
    );
}
