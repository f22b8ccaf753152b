//! Pipeline orchestration
//!
//! Owns the source, dispatcher and sink, and runs the whole flow under a
//! single cancellation token.
//!
//! # Shutdown order
//!
//! The source always stops first, naturally at the end of the stream or on
//! the shutdown signal, and drops its channel senders on exit. The workers
//! then drain whatever is already in flight and stop, and only once the
//! dispatcher has stopped is the sink closed. No send can race a closed
//! sink.
//!
//! # Example
//!
//! ```ignore
//! use sluice_pipeline::Pipeline;
//! use sluice_processor::create_default_registry;
//! use tokio_util::sync::CancellationToken;
//!
//! let registry = create_default_registry();
//! let pipeline = Pipeline::from_config(&config, &registry).await?;
//!
//! let cancel = CancellationToken::new();
//! pipeline.run(cancel).await?;
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use sluice_config::Config;
use sluice_processor::{Chain, ProcessorRegistry};
use sluice_protocol::Record;
use sluice_sinks::{KafkaSink, Sink};
use sluice_sources::{KafkaSource, KafkaSourceMetricsHandle, SourceError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::dispatcher::Dispatcher;
use crate::error::{PipelineError, PipelineResult};
use crate::metrics::PipelineMetricsHandle;
use crate::reporter::MetricsReporter;
use crate::{ERROR_CHANNEL_CAPACITY, RECORD_CHANNEL_CAPACITY};

/// Lifecycle states of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PipelineState {
    /// Source, chain and sink constructed, nothing started
    Created = 0,
    /// All stages running
    Running = 1,
    /// No new records admitted, in-flight records finishing
    Draining = 2,
    /// All stages stopped, source and sink closed
    Stopped = 3,
}

impl PipelineState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::Running,
            2 => Self::Draining,
            _ => Self::Stopped,
        }
    }

    /// State name for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle for observing the pipeline state
///
/// Holds an Arc to the state, so it remains valid after `run()` consumes
/// the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineStateHandle {
    state: Arc<AtomicU8>,
}

impl PipelineStateHandle {
    /// Current state
    pub fn state(&self) -> PipelineState {
        PipelineState::from_u8(self.state.load(Ordering::SeqCst))
    }
}

/// The assembled record flow: source, worker pool and sink
pub struct Pipeline {
    source: KafkaSource,
    source_metrics: KafkaSourceMetricsHandle,
    dispatcher: Dispatcher,
    sink: Arc<dyn Sink>,
    metrics: PipelineMetricsHandle,
    state: Arc<AtomicU8>,
}

impl Pipeline {
    /// Build the whole pipeline from a validated configuration
    ///
    /// Constructs the chain, the source and the sink, wiring them through
    /// bounded channels. For the Kafka sink the broker is only contacted
    /// here when `auto_create_topic` is set.
    ///
    /// # Errors
    /// Fails when a declared processor cannot be built, or when the source
    /// or sink rejects its configuration.
    pub async fn from_config(config: &Config, registry: &ProcessorRegistry) -> PipelineResult<Self> {
        let chain = Chain::from_configs(registry, &config.processors)?;

        let (record_tx, record_rx) = mpsc::channel(RECORD_CHANNEL_CAPACITY);
        let (error_tx, error_rx) = mpsc::channel(ERROR_CHANNEL_CAPACITY);

        let source = KafkaSource::new(config.input.clone(), record_tx, error_tx)?;
        let sink: Arc<dyn Sink> = Arc::new(KafkaSink::new(config.output.clone()).await?);

        let pipeline = Self::new(
            source,
            record_rx,
            error_rx,
            chain,
            sink,
            config.input.workers,
        );
        info!(
            input_topic = %config.input.topic,
            output_topic = %config.output.topic,
            workers = pipeline.workers(),
            processors = ?pipeline.processor_names(),
            "pipeline assembled"
        );
        Ok(pipeline)
    }

    /// Assemble a pipeline from already-constructed stages
    ///
    /// The channel receivers must be the ones whose senders the source
    /// holds.
    pub fn new(
        source: KafkaSource,
        record_rx: mpsc::Receiver<Record>,
        error_rx: mpsc::Receiver<SourceError>,
        chain: Chain,
        sink: Arc<dyn Sink>,
        workers: usize,
    ) -> Self {
        let dispatcher = Dispatcher::new(record_rx, error_rx, chain, Arc::clone(&sink), workers);

        Self {
            source_metrics: source.metrics_handle(),
            metrics: dispatcher.metrics_handle(),
            state: Arc::new(AtomicU8::new(PipelineState::Created as u8)),
            source,
            dispatcher,
            sink,
        }
    }

    /// Current state
    pub fn state(&self) -> PipelineState {
        PipelineState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Get a state handle that outlives `run()`
    pub fn state_handle(&self) -> PipelineStateHandle {
        PipelineStateHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Get a metrics handle that outlives `run()`
    pub fn metrics_handle(&self) -> PipelineMetricsHandle {
        self.metrics.clone()
    }

    /// Number of workers the dispatcher will run
    pub fn workers(&self) -> usize {
        self.dispatcher.workers()
    }

    /// Names of the chain's processors in application order
    pub fn processor_names(&self) -> Vec<&'static str> {
        self.dispatcher.processor_names()
    }

    /// Run the pipeline until the stream ends or cancellation fires
    ///
    /// Returns after the full shutdown sequence: source stopped, workers
    /// drained, sink closed. Task panics and a failed sink close surface
    /// as an error once shutdown has completed; a source that stops with
    /// an error is logged and does not interrupt the drain.
    pub async fn run(self, cancel: CancellationToken) -> PipelineResult<()> {
        let Self {
            source,
            source_metrics,
            dispatcher,
            sink,
            metrics,
            state,
        } = self;

        state.store(PipelineState::Running as u8, Ordering::SeqCst);
        info!(
            workers = dispatcher.workers(),
            processors = ?dispatcher.processor_names(),
            "pipeline running"
        );

        let reporter = MetricsReporter::new(source_metrics.clone(), metrics.clone());
        let reporter_cancel = cancel.child_token();
        let reporter_task = tokio::spawn(reporter.run(reporter_cancel.clone()));

        let mut source_task = tokio::spawn(source.run(cancel.clone()));
        let dispatcher_task = tokio::spawn(dispatcher.run(cancel.clone()));

        let mut failure: Option<PipelineError> = None;

        // The source ends first, at the natural end of the stream or on
        // the shutdown signal. Either way no new records are admitted
        // afterwards; its channel senders drop when the task returns.
        let source_result = tokio::select! {
            _ = cancel.cancelled() => {
                state.store(PipelineState::Draining as u8, Ordering::SeqCst);
                info!("shutdown signal received, draining in-flight records");
                source_task.await
            }
            result = &mut source_task => {
                state.store(PipelineState::Draining as u8, Ordering::SeqCst);
                info!("source finished, draining in-flight records");
                result
            }
        };
        match source_result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "source stopped with error"),
            Err(e) => {
                failure = Some(PipelineError::task("source", e.to_string()));
            }
        }

        // Workers finish whatever they already pulled, then the
        // dispatcher stops.
        if let Err(e) = dispatcher_task.await {
            if failure.is_none() {
                failure = Some(PipelineError::task("dispatcher", e.to_string()));
            } else {
                error!(error = %e, "dispatcher task panicked");
            }
        }

        reporter_cancel.cancel();
        if let Err(e) = reporter_task.await {
            error!(error = %e, "metrics reporter task panicked");
        }

        // The sink closes only after every worker has exited.
        if let Err(e) = sink.close().await {
            if failure.is_none() {
                failure = Some(PipelineError::Sink(e));
            } else {
                error!(error = %e, "sink close failed");
            }
        }

        state.store(PipelineState::Stopped as u8, Ordering::SeqCst);

        let source_snapshot = source_metrics.snapshot();
        let pipeline_snapshot = metrics.snapshot();
        info!(
            records_read = source_snapshot.records_read,
            records_sent = pipeline_snapshot.records_sent,
            records_dropped = pipeline_snapshot.records_dropped,
            records_errored = pipeline_snapshot.records_errored,
            "pipeline stopped"
        );

        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("workers", &self.dispatcher.workers())
            .field("processors", &self.dispatcher.processor_names())
            .field("sink", &self.sink.name())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
