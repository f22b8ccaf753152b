//! Mock sink - buffers records in memory
//!
//! Test double standing in for a broker-backed sink. It buffers every
//! delivered record, can be told to fail the next N sends, and remembers
//! whether it was closed, so pipeline tests can assert on delivery counts,
//! error paths and shutdown ordering without a broker.
//!
//! # Example
//!
//! ```ignore
//! use sluice_sinks::{MockSink, Sink};
//!
//! let sink = MockSink::new();
//! sink.fail_next(2);
//!
//! assert!(sink.send(record.clone()).await.is_err());
//! assert!(sink.send(record.clone()).await.is_err());
//! assert!(sink.send(record).await.is_ok());
//! assert_eq!(sink.sent_count(), 1);
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use sluice_protocol::Record;

use crate::error::SinkError;
use crate::{Sink, SinkResult};

#[cfg(test)]
#[path = "mock_test.rs"]
mod tests;

/// In-memory sink for tests
///
/// Sends append to a buffer in call order. A send after `close()` is an
/// error, so shutdown-ordering violations surface in tests.
#[derive(Debug, Default)]
pub struct MockSink {
    /// Successfully delivered records, in send order
    records: Mutex<Vec<Record>>,

    /// Sends left to fail before deliveries succeed again
    fail_next: AtomicUsize,

    /// Set once `close()` has run
    closed: AtomicBool,
}

impl MockSink {
    /// Create an empty mock sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` sends fail with a write error
    pub fn fail_next(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Number of records delivered so far
    pub fn sent_count(&self) -> usize {
        self.records.lock().len()
    }

    /// Copy of the delivered records, in send order
    pub fn sent(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    /// Check whether `close()` has run
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Sink for MockSink {
    fn send<'a>(
        &'a self,
        record: Record,
    ) -> Pin<Box<dyn Future<Output = SinkResult<()>> + Send + 'a>> {
        Box::pin(async move {
            if self.is_closed() {
                return Err(SinkError::write("send after close"));
            }

            let failures_left = self
                .fail_next
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
            if failures_left.is_ok() {
                return Err(SinkError::write("simulated delivery failure"));
            }

            self.records.lock().push(record);
            Ok(())
        })
    }

    fn close<'a>(&'a self) -> Pin<Box<dyn Future<Output = SinkResult<()>> + Send + 'a>> {
        Box::pin(async move {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
