//! Run command implementation
//!
//! Streams events through the configured transport until a limit is reached
//! or Ctrl-C is pressed, then logs the final summary.

use anyhow::{Context, Result};
use clap::Args;
use credit_core::types::RiskLevel;
use credit_core::DatasetLoader;
use credit_producer::bronze::{BronzeConsumer, ConsumerStats, InMemoryBronzeStore};
use credit_producer::config::{ProducerConfig, TransportKind};
use credit_producer::engine::{FinalSummary, SimulationEngine};
use credit_producer::transport::{EventTransport, InMemoryTransport, JsonLinesTransport};
use credit_simulators::latency::NetworkCondition;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Records kept by the in-memory transport during a CLI run.
const MEMORY_RETENTION: usize = 10_000;

/// Flags of the `run` command; each overrides the configuration file.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Dataset CSV path
    #[arg(short, long)]
    pub dataset: Option<PathBuf>,

    /// Stop after this many events
    #[arg(short = 'n', long)]
    pub count: Option<u64>,

    /// Maximum run time in seconds
    #[arg(long)]
    pub duration_secs: Option<u64>,

    /// Network profile (excellent, good, normal, poor, terrible)
    #[arg(short, long)]
    pub profile: Option<NetworkCondition>,

    /// Probability of degrading an event (0.0 - 1.0)
    #[arg(long)]
    pub anomaly_rate: Option<f64>,

    /// Seed for every random source
    #[arg(long)]
    pub seed: Option<u64>,

    /// Multiplier applied to simulated delays (0 disables pacing)
    #[arg(long)]
    pub time_scale: Option<f64>,

    /// Write events to this JSON-lines file instead of memory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Events per window summary
    #[arg(long)]
    pub window_capacity: Option<usize>,

    /// Feed published events into an in-memory bronze store (memory
    /// transport only; keeps the newest 10000 events)
    #[arg(long)]
    pub bronze: bool,

    /// Write the run report as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl RunArgs {
    /// Applies the flags on top of `config`.
    pub fn apply(&self, config: &mut ProducerConfig) {
        if let Some(dataset) = &self.dataset {
            config.dataset.path = dataset.clone();
        }
        if let Some(count) = self.count {
            config.run.event_count = Some(count);
        }
        if let Some(secs) = self.duration_secs {
            config.run.max_duration_secs = secs;
        }
        if let Some(profile) = self.profile {
            config.network.profile = profile;
        }
        if let Some(rate) = self.anomaly_rate {
            config.anomaly.rate = rate;
        }
        if let Some(seed) = self.seed {
            config.run.seed = Some(seed);
        }
        if let Some(scale) = self.time_scale {
            config.run.time_scale = scale;
        }
        if let Some(output) = &self.output {
            config.transport.kind = TransportKind::Jsonl;
            config.transport.path = output.clone();
        }
        if let Some(capacity) = self.window_capacity {
            config.window.capacity = capacity;
        }
    }
}

type BronzeSink = (Arc<InMemoryBronzeStore>, JoinHandle<ConsumerStats>);

/// Everything built before the engine starts.
struct Setup {
    engine: SimulationEngine,
    memory: Option<Arc<InMemoryTransport>>,
    bronze: Option<BronzeSink>,
}

/// Logs an empty summary for a run that never started.
fn setup_failed(err: anyhow::Error) -> anyhow::Error {
    error!("Simulation setup failed: {:#}", err);
    FinalSummary::empty("-").log();
    err
}

async fn setup(config: &ProducerConfig, bronze: bool) -> Result<Setup> {
    config.validate()?;

    info!("Starting simulation...");
    info!("  Dataset: {}", config.dataset.path.display());
    info!("  Profile: {}", config.network.profile);
    info!("  Anomaly rate: {:.1}%", config.anomaly.rate * 100.0);
    info!("  Window capacity: {}", config.window.capacity);

    let dataset = DatasetLoader::new()
        .load(&config.dataset.path)
        .context("dataset load failed")?;

    let mut memory = None;
    let transport: Arc<dyn EventTransport> = match config.transport.kind {
        TransportKind::Memory => {
            let transport = Arc::new(
                InMemoryTransport::new(config.transport.stream_name.clone())
                    .with_retention(MEMORY_RETENTION),
            );
            memory = Some(transport.clone());
            transport
        }
        TransportKind::Jsonl => Arc::new(
            JsonLinesTransport::open(
                config.transport.stream_name.clone(),
                &config.transport.path,
            )
            .await?,
        ),
    };

    let engine = SimulationEngine::from_config(config, dataset, transport)?;

    let bronze = match (&memory, bronze) {
        (Some(transport), true) => {
            let store = Arc::new(InMemoryBronzeStore::with_capacity(MEMORY_RETENTION));
            let rx = transport.subscribe_bounded(MEMORY_RETENTION);
            let handle = BronzeConsumer::new(rx, store.clone()).spawn();
            Some((store, handle))
        }
        (None, true) => {
            warn!("--bronze needs the memory transport; ignored");
            None
        }
        _ => None,
    };

    Ok(Setup {
        engine,
        memory,
        bronze,
    })
}

/// Run the simulation
pub async fn run(mut config: ProducerConfig, args: RunArgs) -> Result<()> {
    args.apply(&mut config);

    let Setup {
        mut engine,
        memory,
        bronze,
    } = setup(&config, args.bronze).await.map_err(setup_failed)?;

    let cancel = engine.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            cancel.cancel();
        }
    });

    let report = engine.run(config.limits()).await?;
    report.summary.log();

    if let (Some(transport), Some((store, handle))) = (&memory, bronze) {
        transport.close();
        let stats = handle.await.context("bronze consumer task failed")?;
        let counts = store.risk_counts();
        info!(
            "Bronze store: {} events ({} stored, {} failures) | Risk L/M/H {}/{}/{}",
            store.len(),
            stats.stored,
            stats.decode_failures + stats.store_failures,
            counts.get(&RiskLevel::Low).copied().unwrap_or(0),
            counts.get(&RiskLevel::Medium).copied().unwrap_or(0),
            counts.get(&RiskLevel::High).copied().unwrap_or(0),
        );
    }

    if let Some(path) = &args.report {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("cannot write report to {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    /// Runs `run` on the current thread with its log captured.
    async fn run_captured(config: ProducerConfig, flags: RunArgs) -> (Result<()>, String) {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);
        let result = run(config, flags).await;
        (result, buffer.contents())
    }

    fn args() -> RunArgs {
        RunArgs {
            dataset: None,
            count: None,
            duration_secs: None,
            profile: None,
            anomaly_rate: None,
            seed: None,
            time_scale: None,
            output: None,
            window_capacity: None,
            bronze: false,
            report: None,
        }
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = ProducerConfig::default();
        let flags = RunArgs {
            count: Some(50),
            profile: Some(NetworkCondition::Poor),
            output: Some(PathBuf::from("out/events.jsonl")),
            time_scale: Some(0.0),
            ..args()
        };
        flags.apply(&mut config);

        assert_eq!(config.run.event_count, Some(50));
        assert_eq!(config.network.profile, NetworkCondition::Poor);
        assert_eq!(config.transport.kind, TransportKind::Jsonl);
        assert_eq!(config.run.time_scale, 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_no_flags_keep_config() {
        let mut config = ProducerConfig::default();
        args().apply(&mut config);
        assert_eq!(config, ProducerConfig::default());
    }

    #[tokio::test]
    async fn test_invalid_config_logs_summary() {
        let mut config = ProducerConfig::default();
        config.anomaly.rate = 2.0;

        let (result, log) = run_captured(config, args()).await;

        assert!(result.is_err());
        assert!(log.contains("Simulation setup failed"));
        assert!(log.contains("FINAL SUMMARY"));
        assert!(log.contains("Run -: Idle (not started)"));
    }

    #[tokio::test]
    async fn test_unopenable_output_logs_summary() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = dir.path().join("data.csv");
        std::fs::write(
            &dataset,
            "ID,LIMIT_BAL,SEX,EDUCATION,MARRIAGE,AGE,PAY_0,PAY_2,PAY_3,PAY_4,PAY_5,PAY_6,\
BILL_AMT1,BILL_AMT2,BILL_AMT3,BILL_AMT4,BILL_AMT5,BILL_AMT6,\
PAY_AMT1,PAY_AMT2,PAY_AMT3,PAY_AMT4,PAY_AMT5,PAY_AMT6,default payment next month\n\
1,20000,2,2,1,24,2,2,-1,-1,-2,-2,3913,3102,689,0,0,0,0,689,0,0,0,0,1\n",
        )
        .unwrap();
        // A regular file where the output directory should be
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let flags = RunArgs {
            dataset: Some(dataset),
            output: Some(blocker.join("events.jsonl")),
            ..args()
        };
        let (result, log) = run_captured(ProducerConfig::default(), flags).await;

        assert!(result.is_err());
        assert!(log.contains("FINAL SUMMARY"));
    }
}
