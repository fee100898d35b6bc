//! In-process transport.

use async_channel::{Receiver, Sender, TrySendError};
use async_trait::async_trait;
use credit_core::types::BankingEvent;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use super::{EventTransport, SequenceMarker, DEFAULT_STREAM_NAME};
use crate::error::TransportError;

const SHARD_ID: &str = "shardId-000000000000";

/// A record as accepted by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedRecord {
    /// Event identifier
    pub event_id: String,
    /// Partition key (customer identifier)
    pub partition_key: String,
    /// JSON payload
    pub payload: Vec<u8>,
    /// Assigned position
    pub marker: SequenceMarker,
}

impl PublishedRecord {
    /// Decodes the payload back into an event.
    pub fn decode(&self) -> serde_json::Result<BankingEvent> {
        serde_json::from_slice(&self.payload)
    }
}

#[derive(Debug, Default)]
struct State {
    attempts: u64,
    sequence: u64,
    records: VecDeque<PublishedRecord>,
    subscribers: Vec<Sender<PublishedRecord>>,
    dropped: u64,
    closed: bool,
}

/// Transport keeping published records in memory.
///
/// Optionally rejects every n-th publish attempt to exercise failure paths,
/// and fans accepted records out to subscribers.
#[derive(Debug)]
pub struct InMemoryTransport {
    name: String,
    fail_every: Option<u64>,
    retention: Option<usize>,
    state: Mutex<State>,
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new(DEFAULT_STREAM_NAME)
    }
}

impl InMemoryTransport {
    /// Creates an empty transport named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fail_every: None,
            retention: None,
            state: Mutex::new(State::default()),
        }
    }

    /// Rejects every `n`-th publish attempt (`n = 0` disables).
    pub fn with_failure_every(mut self, n: u64) -> Self {
        self.fail_every = (n > 0).then_some(n);
        self
    }

    /// Keeps only the most recent `max` records.
    pub fn with_retention(mut self, max: usize) -> Self {
        self.retention = Some(max);
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Receives every record accepted from now on.
    pub fn subscribe(&self) -> Receiver<PublishedRecord> {
        self.attach(async_channel::unbounded())
    }

    /// Like [`subscribe`](Self::subscribe) but buffers at most `capacity`
    /// records; records arriving while the buffer is full are dropped.
    pub fn subscribe_bounded(&self, capacity: usize) -> Receiver<PublishedRecord> {
        self.attach(async_channel::bounded(capacity.max(1)))
    }

    fn attach(
        &self,
        (tx, rx): (Sender<PublishedRecord>, Receiver<PublishedRecord>),
    ) -> Receiver<PublishedRecord> {
        let mut state = self.state();
        if state.closed {
            tx.close();
        } else {
            state.subscribers.push(tx);
        }
        rx
    }

    /// Rejects further publishes and ends every subscription.
    pub fn close(&self) {
        let mut state = self.state();
        state.closed = true;
        for subscriber in state.subscribers.drain(..) {
            subscriber.close();
        }
    }

    /// Retained records in publish order.
    pub fn records(&self) -> Vec<PublishedRecord> {
        self.state().records.iter().cloned().collect()
    }

    /// Retained records decoded back into events.
    pub fn events(&self) -> Vec<BankingEvent> {
        self.state()
            .records
            .iter()
            .filter_map(|record| record.decode().ok())
            .collect()
    }

    /// Records accepted so far, including those no longer retained.
    pub fn accepted(&self) -> u64 {
        self.state().sequence
    }

    /// Records a full subscriber buffer could not take.
    pub fn dropped(&self) -> u64 {
        self.state().dropped
    }

    /// Publish attempts so far, accepted or not.
    pub fn attempts(&self) -> u64 {
        self.state().attempts
    }
}

#[async_trait]
impl EventTransport for InMemoryTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(
        &self,
        event_id: &str,
        partition_key: &str,
        payload: &[u8],
    ) -> Result<SequenceMarker, TransportError> {
        let mut state = self.state();
        if state.closed {
            return Err(TransportError::Closed(self.name.clone()));
        }

        state.attempts += 1;
        if let Some(n) = self.fail_every {
            if state.attempts % n == 0 {
                return Err(TransportError::rejected(
                    event_id,
                    format!("injected failure on attempt {}", state.attempts),
                ));
            }
        }

        state.sequence += 1;
        let marker = SequenceMarker {
            shard_id: SHARD_ID.to_string(),
            sequence_number: state.sequence,
        };
        let record = PublishedRecord {
            event_id: event_id.to_string(),
            partition_key: partition_key.to_string(),
            payload: payload.to_vec(),
            marker: marker.clone(),
        };

        let mut dropped = 0;
        state
            .subscribers
            .retain(|subscriber| match subscriber.try_send(record.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    dropped += 1;
                    true
                }
                Err(TrySendError::Closed(_)) => false,
            });
        if dropped > 0 {
            state.dropped += dropped;
            debug!(stream = %self.name, event_id, "Subscriber buffer full, record dropped");
        }

        state.records.push_back(record);
        if let Some(max) = self.retention {
            while state.records.len() > max {
                state.records.pop_front();
            }
        }

        debug!(stream = %self.name, event_id, sequence = marker.sequence_number, "Record accepted");
        Ok(marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_assigns_sequence() {
        let transport = InMemoryTransport::new("test-stream");
        let first = transport.publish("EVT-1", "CUST-000001", b"{}").await.unwrap();
        let second = transport.publish("EVT-2", "CUST-000002", b"{}").await.unwrap();
        assert_eq!(first.sequence_number, 1);
        assert_eq!(second.sequence_number, 2);
        assert_eq!(transport.records().len(), 2);
        assert_eq!(transport.records()[1].partition_key, "CUST-000002");
        assert_eq!(transport.name(), "test-stream");
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let transport = InMemoryTransport::default().with_failure_every(3);
        let mut failures = 0;
        for i in 0..9 {
            if transport.publish(&format!("EVT-{}", i), "CUST", b"{}").await.is_err() {
                failures += 1;
            }
        }
        assert_eq!(failures, 3);
        assert_eq!(transport.accepted(), 6);
        assert_eq!(transport.attempts(), 9);
    }

    #[tokio::test]
    async fn test_retention_bound() {
        let transport = InMemoryTransport::default().with_retention(2);
        for i in 0..5 {
            transport.publish(&format!("EVT-{}", i), "CUST", b"{}").await.unwrap();
        }
        let ids: Vec<_> = transport.records().into_iter().map(|r| r.event_id).collect();
        assert_eq!(ids, vec!["EVT-3", "EVT-4"]);
        assert_eq!(transport.accepted(), 5);
    }

    #[tokio::test]
    async fn test_subscribers_and_close() {
        let transport = InMemoryTransport::default();
        let rx = transport.subscribe();
        transport.publish("EVT-1", "CUST", b"{}").await.unwrap();
        transport.close();

        assert_eq!(rx.recv().await.unwrap().event_id, "EVT-1");
        assert!(rx.recv().await.is_err());
        assert!(matches!(
            transport.publish("EVT-2", "CUST", b"{}").await,
            Err(TransportError::Closed(_))
        ));
        assert!(transport.subscribe().recv().await.is_err());
    }

    #[tokio::test]
    async fn test_bounded_subscriber_drops_overflow() {
        let transport = InMemoryTransport::default();
        let rx = transport.subscribe_bounded(2);
        for i in 0..4 {
            transport.publish(&format!("EVT-{}", i), "CUST", b"{}").await.unwrap();
        }
        assert_eq!(transport.dropped(), 2);

        assert_eq!(rx.recv().await.unwrap().event_id, "EVT-0");
        transport.publish("EVT-4", "CUST", b"{}").await.unwrap();
        transport.close();

        let rest: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|r| r.event_id)
            .collect();
        assert_eq!(rest, vec!["EVT-1", "EVT-4"]);
        assert_eq!(transport.accepted(), 5);
    }
}
