//! Seeding helpers.
//!
//! Every simulator owns a `StdRng`. A run seed is split into independent
//! per-simulator streams so adding draws to one simulator never shifts the
//! sequence seen by another.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Stream identifiers used to derive per-simulator seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RngStream {
    /// Run tag for event identifiers
    RunTag,
    /// Anomaly injector draws
    Anomaly,
    /// Latency simulator draws
    Latency,
}

impl RngStream {
    fn salt(self) -> u64 {
        match self {
            RngStream::RunTag => 0x5EED_0001,
            RngStream::Anomaly => 0x5EED_0002,
            RngStream::Latency => 0x5EED_0003,
        }
    }
}

/// Derives the seed for one stream from a run seed (SplitMix64 finaliser).
pub fn derive_seed(run_seed: u64, stream: RngStream) -> u64 {
    let mut z = run_seed ^ stream.salt().wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seeded generator for `stream`, or an entropy-seeded one when no run seed is set.
pub fn stream_rng(run_seed: Option<u64>, stream: RngStream) -> StdRng {
    match run_seed {
        Some(seed) => StdRng::seed_from_u64(derive_seed(seed, stream)),
        None => StdRng::from_entropy(),
    }
}
