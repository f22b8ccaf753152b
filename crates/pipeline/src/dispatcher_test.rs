//! Dispatcher tests
//!
//! Worker pool behavior driven through the public API: delivery, record
//! accounting, cancellation semantics and the lifecycle state machine.

use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::{Map, Value, json};
use sluice_processor::{DropConfig, DropProcessor, Processor, ProcessorError, ProcessorResult};
use sluice_protocol::{ProtocolError, RecordBuilder};
use sluice_sinks::{MockSink, SinkError, SinkResult};
use sluice_sources::SourceError;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::{
    Chain, Dispatcher, DispatcherState, DispatcherStateHandle, PipelineMetricsHandle,
    PipelineMetricsSnapshot, Record, Sink,
};

// ============================================================================
// Helpers
// ============================================================================

fn create_record_with_status(offset: i64, status: &str) -> Record {
    let mut fields = Map::new();
    fields.insert("message".to_string(), json!("hello"));
    fields.insert("status".to_string(), json!(status));

    RecordBuilder::new("events", 0, offset)
        .key("user-1")
        .value(format!(r#"{{"message":"hello","status":"{status}"}}"#))
        .value_fields(fields)
        .build()
}

fn create_test_record(offset: i64) -> Record {
    create_record_with_status(offset, "active")
}

/// A running dispatcher with its channel senders and handles
struct TestHarness {
    record_tx: mpsc::Sender<Record>,
    error_tx: mpsc::Sender<SourceError>,
    state: DispatcherStateHandle,
    metrics: PipelineMetricsHandle,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl TestHarness {
    /// Close both channels and wait for the dispatcher to stop
    async fn finish(self) -> PipelineMetricsSnapshot {
        drop(self.record_tx);
        drop(self.error_tx);
        self.task.await.expect("dispatcher task failed");
        self.metrics.snapshot()
    }
}

fn spawn_dispatcher(chain: Chain, sink: Arc<dyn Sink>, workers: usize) -> TestHarness {
    let (record_tx, record_rx) = mpsc::channel(128);
    let (error_tx, error_rx) = mpsc::channel(128);

    let dispatcher = Dispatcher::new(record_rx, error_rx, chain, sink, workers);
    let state = dispatcher.state_handle();
    let metrics = dispatcher.metrics_handle();

    let cancel = CancellationToken::new();
    let task = tokio::spawn(dispatcher.run(cancel.clone()));

    TestHarness {
        record_tx,
        error_tx,
        state,
        metrics,
        cancel,
        task,
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("timed out waiting for condition");
}

async fn wait_for_state(handle: &DispatcherStateHandle, want: DispatcherState) {
    wait_until(|| handle.state() == want).await;
}

fn drop_inactive_chain() -> Chain {
    let config = DropConfig::new()
        .with_field_name("status")
        .with_filter_criteria("inactive");
    Chain::new(vec![Box::new(DropProcessor::new(config).unwrap())])
}

/// Fails every record whose "status" field is "poison"
struct PoisonProcessor;

impl Processor for PoisonProcessor {
    fn process(&self, record: Record) -> ProcessorResult<Option<Record>> {
        match record.value_field("status") {
            Some(Value::String(status)) if status == "poison" => {
                Err(ProcessorError::failed("poison", "refused by test"))
            }
            _ => Ok(Some(record)),
        }
    }

    fn name(&self) -> &'static str {
        "poison"
    }
}

/// Sink whose sends block until a permit is released
struct GatedSink {
    gate: Semaphore,
    entered: AtomicU64,
    delivered: AtomicU64,
}

impl GatedSink {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
            entered: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
        })
    }

    fn entered(&self) -> u64 {
        self.entered.load(Ordering::SeqCst)
    }

    fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::SeqCst)
    }
}

impl Sink for GatedSink {
    fn send<'a>(
        &'a self,
        _record: Record,
    ) -> Pin<Box<dyn Future<Output = SinkResult<()>> + Send + 'a>> {
        Box::pin(async move {
            self.entered.fetch_add(1, Ordering::SeqCst);
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|_| SinkError::write("gate closed"))?;
            permit.forget();
            self.delivered.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn close<'a>(&'a self) -> Pin<Box<dyn Future<Output = SinkResult<()>> + Send + 'a>> {
        Box::pin(async { Ok(()) })
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}

// ============================================================================
// Delivery and ordering
// ============================================================================

#[tokio::test]
async fn test_delivers_records_in_order_with_one_worker() {
    let sink = Arc::new(MockSink::new());
    let harness = spawn_dispatcher(Chain::empty(), sink.clone(), 1);

    for offset in 1..=5 {
        harness
            .record_tx
            .send(create_test_record(offset))
            .await
            .unwrap();
    }

    let snapshot = harness.finish().await;
    assert_eq!(snapshot.records_sent, 5);
    assert_eq!(snapshot.records_errored, 0);

    let offsets: Vec<i64> = sink.sent().iter().map(|r| r.offset()).collect();
    assert_eq!(offsets, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_drop_sentinel_counts_dropped_not_errored() {
    let sink = Arc::new(MockSink::new());
    let harness = spawn_dispatcher(drop_inactive_chain(), sink.clone(), 1);

    for (offset, status) in [
        (1, "active"),
        (2, "inactive"),
        (3, "active"),
        (4, "inactive"),
        (5, "active"),
    ] {
        harness
            .record_tx
            .send(create_record_with_status(offset, status))
            .await
            .unwrap();
    }

    let snapshot = harness.finish().await;
    assert_eq!(snapshot.records_sent, 3);
    assert_eq!(snapshot.records_dropped, 2);
    assert_eq!(snapshot.records_errored, 0);

    let offsets: Vec<i64> = sink.sent().iter().map(|r| r.offset()).collect();
    assert_eq!(offsets, vec![1, 3, 5]);
}

// ============================================================================
// Error accounting
// ============================================================================

#[tokio::test]
async fn test_chain_failure_counts_record_as_errored() {
    let sink = Arc::new(MockSink::new());
    let chain = Chain::new(vec![Box::new(PoisonProcessor)]);
    let harness = spawn_dispatcher(chain, sink.clone(), 1);

    harness
        .record_tx
        .send(create_record_with_status(1, "active"))
        .await
        .unwrap();
    harness
        .record_tx
        .send(create_record_with_status(2, "poison"))
        .await
        .unwrap();
    harness
        .record_tx
        .send(create_record_with_status(3, "active"))
        .await
        .unwrap();

    let snapshot = harness.finish().await;
    assert_eq!(snapshot.records_sent, 2);
    assert_eq!(snapshot.process_errors, 1);
    assert_eq!(snapshot.records_errored, 1);
    assert_eq!(sink.sent_count(), 2);
}

#[tokio::test]
async fn test_delivery_failure_counts_record_as_errored() {
    let sink = Arc::new(MockSink::new());
    sink.fail_next(2);
    let harness = spawn_dispatcher(Chain::empty(), sink.clone(), 1);

    for offset in 1..=5 {
        harness
            .record_tx
            .send(create_test_record(offset))
            .await
            .unwrap();
    }

    let snapshot = harness.finish().await;
    assert_eq!(snapshot.records_sent, 3);
    assert_eq!(snapshot.delivery_errors, 2);
    assert_eq!(snapshot.records_errored, 2);

    let offsets: Vec<i64> = sink.sent().iter().map(|r| r.offset()).collect();
    assert_eq!(offsets, vec![3, 4, 5]);
}

#[tokio::test]
async fn test_conservation_at_quiescence() {
    let sink = Arc::new(MockSink::new());
    sink.fail_next(1);
    let chain = Chain::new(vec![
        Box::new(
            DropProcessor::new(
                DropConfig::new()
                    .with_field_name("status")
                    .with_filter_criteria("inactive"),
            )
            .unwrap(),
        ),
        Box::new(PoisonProcessor),
    ]);
    let harness = spawn_dispatcher(chain, sink.clone(), 1);

    let statuses = ["active", "inactive", "poison", "active"];
    for (offset, status) in statuses.iter().enumerate() {
        harness
            .record_tx
            .send(create_record_with_status(offset as i64, status))
            .await
            .unwrap();
    }

    let snapshot = harness.finish().await;
    assert_eq!(snapshot.records_dropped, 1);
    assert_eq!(snapshot.process_errors, 1);
    assert_eq!(snapshot.delivery_errors, 1);
    assert_eq!(snapshot.records_sent, 1);

    // Every record that went in is sent, dropped or errored
    assert_eq!(snapshot.records_accounted(), statuses.len() as u64);
}

#[tokio::test]
async fn test_error_drain_classifies_source_errors() {
    let sink = Arc::new(MockSink::new());
    let harness = spawn_dispatcher(Chain::empty(), sink, 1);

    harness
        .error_tx
        .send(SourceError::deserialize(
            "events",
            0,
            7,
            ProtocolError::unsupported_format("avro"),
        ))
        .await
        .unwrap();
    harness.error_tx.send(SourceError::ChannelClosed).await.unwrap();

    let snapshot = harness.finish().await;

    // A decode failure loses a record; a transient ingest failure does not
    assert_eq!(snapshot.decode_errors, 1);
    assert_eq!(snapshot.records_errored, 1);
    assert_eq!(snapshot.ingest_errors, 1);
    assert_eq!(snapshot.records_accounted(), 1);
}

// ============================================================================
// Cancellation and states
// ============================================================================

#[tokio::test]
async fn test_state_machine_passes_through_states_in_order() {
    let sink = GatedSink::new();

    let (record_tx, record_rx) = mpsc::channel(8);
    let (_error_tx, error_rx) = mpsc::channel::<SourceError>(8);
    let dispatcher = Dispatcher::new(record_rx, error_rx, Chain::empty(), sink.clone(), 1);
    assert_eq!(dispatcher.state(), DispatcherState::Idle);

    let state = dispatcher.state_handle();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(dispatcher.run(cancel.clone()));
    wait_for_state(&state, DispatcherState::Running).await;

    // Park the worker inside Sink::send
    record_tx.send(create_test_record(1)).await.unwrap();
    wait_until(|| sink.entered() == 1).await;

    // The error drain observes cancellation while the worker is still
    // sending, so Stopping is visible from outside
    cancel.cancel();
    wait_for_state(&state, DispatcherState::Stopping).await;
    assert_eq!(sink.delivered(), 0);

    // Deliver-current: the in-flight record completes despite cancellation
    sink.gate.add_permits(1);
    task.await.unwrap();
    assert_eq!(state.state(), DispatcherState::Stopped);
    assert_eq!(sink.delivered(), 1);
}

#[tokio::test]
async fn test_cancellation_leaves_buffered_records_unprocessed() {
    let sink = GatedSink::new();
    let harness = spawn_dispatcher(Chain::empty(), sink.clone(), 1);
    wait_for_state(&harness.state, DispatcherState::Running).await;

    harness.record_tx.send(create_test_record(1)).await.unwrap();
    wait_until(|| sink.entered() == 1).await;

    // Buffered behind the in-flight record; never pulled after cancel
    harness.record_tx.send(create_test_record(2)).await.unwrap();
    harness.record_tx.send(create_test_record(3)).await.unwrap();
    harness.cancel.cancel();
    sink.gate.add_permits(1);

    let snapshot = harness.finish().await;
    assert_eq!(sink.delivered(), 1);
    assert_eq!(snapshot.records_sent, 1);
    assert_eq!(snapshot.records_accounted(), 1);
}

#[tokio::test]
async fn test_stream_end_without_cancellation_skips_stopping() {
    let sink = Arc::new(MockSink::new());
    let harness = spawn_dispatcher(Chain::empty(), sink, 1);
    wait_for_state(&harness.state, DispatcherState::Running).await;

    let state = harness.state.clone();
    harness.finish().await;
    assert_eq!(state.state(), DispatcherState::Stopped);
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_record_processed_exactly_once_with_many_workers() {
    let sink = Arc::new(MockSink::new());
    let harness = spawn_dispatcher(Chain::empty(), sink.clone(), 4);

    for offset in 0..100 {
        harness
            .record_tx
            .send(create_test_record(offset))
            .await
            .unwrap();
    }

    let snapshot = harness.finish().await;
    assert_eq!(snapshot.records_sent, 100);
    assert_eq!(snapshot.records_accounted(), 100);

    let offsets: BTreeSet<i64> = sink.sent().iter().map(|r| r.offset()).collect();
    assert_eq!(offsets.len(), 100);
    assert_eq!(offsets, (0..100).collect::<BTreeSet<i64>>());
}

#[tokio::test]
async fn test_zero_workers_normalized_to_one() {
    let (_record_tx, record_rx) = mpsc::channel(8);
    let (_error_tx, error_rx) = mpsc::channel::<SourceError>(8);

    let dispatcher = Dispatcher::new(
        record_rx,
        error_rx,
        Chain::empty(),
        Arc::new(MockSink::new()),
        0,
    );
    assert_eq!(dispatcher.workers(), 1);
}
