//! Stream transport contract and local implementations.
//!
//! The engine publishes each event as a JSON payload keyed by the customer
//! identifier. Delivery is not guaranteed: a failed publish is logged and
//! counted, never retried.
//!
//! - [`InMemoryTransport`]: keeps published records and fans them out to
//!   subscribers; used by tests and the bronze consumer
//! - [`JsonLinesTransport`]: appends one JSON object per line to a file

mod jsonl;
mod memory;

pub use jsonl::JsonLinesTransport;
pub use memory::{InMemoryTransport, PublishedRecord};

use async_trait::async_trait;
use serde::Serialize;

use crate::error::TransportError;

/// Default stream name.
pub const DEFAULT_STREAM_NAME: &str = "local-kinesis-stream";

/// Position assigned to a published record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceMarker {
    /// Shard the record landed on
    pub shard_id: String,
    /// Monotonic sequence number within the shard
    pub sequence_number: u64,
}

/// Destination for published events.
#[async_trait]
pub trait EventTransport: Send + Sync {
    /// Stream name, for logging
    fn name(&self) -> &str;

    /// Publishes one serialised event.
    async fn publish(
        &self,
        event_id: &str,
        partition_key: &str,
        payload: &[u8],
    ) -> Result<SequenceMarker, TransportError>;

    /// Flushes buffered records.
    async fn flush(&self) -> Result<(), TransportError> {
        Ok(())
    }
}
