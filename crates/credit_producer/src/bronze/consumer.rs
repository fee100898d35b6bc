//! Stream consumer writing into a bronze store.

use async_channel::Receiver;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::{BronzeIndexKey, BronzeStore};
use crate::transport::PublishedRecord;

/// Consumer counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConsumerStats {
    /// Records received from the stream
    pub received: u64,
    /// Records written to the store
    pub stored: u64,
    /// Payloads that were not banking events
    pub decode_failures: u64,
    /// Writes rejected by the store
    pub store_failures: u64,
}

/// Drains a transport subscription into a bronze store.
pub struct BronzeConsumer {
    receiver: Receiver<PublishedRecord>,
    store: Arc<dyn BronzeStore>,
}

impl BronzeConsumer {
    /// Creates a consumer for `receiver`.
    pub fn new(receiver: Receiver<PublishedRecord>, store: Arc<dyn BronzeStore>) -> Self {
        Self { receiver, store }
    }

    /// Consumes until the subscription is closed.
    pub async fn run(self) -> ConsumerStats {
        let mut stats = ConsumerStats::default();

        while let Ok(record) = self.receiver.recv().await {
            stats.received += 1;
            let event = match record.decode() {
                Ok(event) => event,
                Err(e) => {
                    warn!(event_id = %record.event_id, "Undecodable payload: {}", e);
                    stats.decode_failures += 1;
                    continue;
                }
            };

            let key = BronzeIndexKey::for_event(&event);
            match self.store.put(event, key).await {
                Ok(()) => stats.stored += 1,
                Err(e) => {
                    warn!(event_id = %record.event_id, "Bronze write failed: {}", e);
                    stats.store_failures += 1;
                }
            }
        }

        info!(
            "Bronze consumer finished: {} received, {} stored, {} failures",
            stats.received,
            stats.stored,
            stats.decode_failures + stats.store_failures
        );
        stats
    }

    /// Runs the consumer on a background task.
    pub fn spawn(self) -> JoinHandle<ConsumerStats> {
        tokio::spawn(self.run())
    }
}
