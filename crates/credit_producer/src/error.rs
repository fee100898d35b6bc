//! Error types for the producer service.

use credit_core::DatasetLoadError;
use credit_simulators::SimulatorError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::engine::EngineState;

/// Publishing to the stream transport failed.
///
/// Always recoverable: the engine counts the failure and moves on.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport refused the record
    #[error("Record {event_id} rejected: {reason}")]
    Rejected {
        /// Identifier of the rejected event
        event_id: String,
        /// Reason given by the transport
        reason: String,
    },

    /// The transport has been closed
    #[error("Transport '{0}' is closed")]
    Closed(String),

    /// The transport is temporarily unusable
    #[error("Transport unavailable: {0}")]
    Unavailable(String),

    /// Event could not be serialised
    #[error("Serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),

    /// IO error writing the stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Create a rejection error
    pub fn rejected(event_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            event_id: event_id.into(),
            reason: reason.into(),
        }
    }

    /// Create an unavailability error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// Writing to or decoding for the bronze store failed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Payload is not a banking event
    #[error("Payload decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Store is unusable
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Top-level producer error.
#[derive(Debug, Error)]
pub enum ProducerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Dataset could not be loaded
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetLoadError),

    /// Simulator parameters rejected
    #[error("Simulator error: {0}")]
    Simulator(#[from] SimulatorError),

    /// Transport could not be opened
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Bronze store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// `run` called on an engine that is not idle
    #[error("Engine cannot start from state {0:?}")]
    InvalidState(EngineState),
}

/// Result alias for producer operations.
pub type Result<T> = std::result::Result<T, ProducerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TransportError::rejected("EVT-1", "throttled");
        assert_eq!(err.to_string(), "Record EVT-1 rejected: throttled");

        let err: ProducerError = SimulatorError::ZeroWindowCapacity.into();
        assert!(err.to_string().contains("Window capacity"));

        let err = ProducerError::InvalidState(EngineState::StoppedByLimit);
        assert!(err.to_string().contains("StoppedByLimit"));
    }
}
