//! # credit_producer: Event Stream Producer
//!
//! ## Layer 3 (Service) Role
//!
//! credit_producer wires the simulator layers into a running service:
//! - Configuration with TOML, environment and CLI overrides (`config`)
//! - The stream transport contract and local transports (`transport`)
//! - The bronze store contract, an in-memory store and its consumer (`bronze`)
//! - The simulation orchestrator and its run report (`engine`)
//!
//! ## Usage Examples
//!
//! ```rust,no_run
//! use credit_producer::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn demo() -> credit_producer::error::Result<()> {
//! let config = ProducerConfig::default();
//! let dataset = DatasetLoader::new().load(&config.dataset.path)?;
//! let transport = Arc::new(InMemoryTransport::default());
//!
//! let mut engine = SimulationEngine::from_config(&config, dataset, transport)?;
//! let report = engine.run(config.limits()).await?;
//! report.summary.log();
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod bronze;
pub mod config;
pub mod engine;
pub mod error;
pub mod transport;

pub use error::{ProducerError, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::bronze::{BronzeConsumer, BronzeIndexKey, BronzeStore, InMemoryBronzeStore};
    pub use crate::config::{ConfigError, ProducerConfig, TransportKind};
    pub use crate::engine::{
        CancelToken, EngineState, FinalSummary, RunLimits, RunReport, SimulationEngine,
        StopReason, WindowCallback,
    };
    pub use crate::error::{ProducerError, StoreError, TransportError};
    pub use crate::transport::{
        EventTransport, InMemoryTransport, JsonLinesTransport, PublishedRecord, SequenceMarker,
    };
    pub use credit_core::{Dataset, DatasetLoader};
}
