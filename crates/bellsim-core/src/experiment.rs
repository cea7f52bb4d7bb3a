//! Experiment engine: a validated configuration plus one random source that
//! is seeded once and threaded through every generation call.
//!
//! Architecture:
//! 1. Build an [`ExperimentConfig`] (policy is mandatory)
//! 2. Seed the random source once from `config.seed`
//! 3. Each call regenerates a fresh [`FrequencyTable`] from scratch
//! 4. Optionally split the run across worker threads and merge the partial
//!    tables by elementwise sum

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::estimator::{self, CorrelationEstimate};
use crate::frequency::FrequencyTable;
use crate::generator;
use crate::lcg::Lcg48;
use crate::model::{ModePolicy, OutcomePair};

/// Trials per estimate used by the live display.
pub const DEFAULT_RUN_LENGTH: usize = 10_000;

/// Seed used when the caller does not supply one.
pub const DEFAULT_SEED: u64 = 0;

/// Which uniform random source drives the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RngKind {
    /// `rand::rngs::StdRng` seeded with `seed_from_u64`.
    #[default]
    Std,
    /// The 48-bit reference [`Lcg48`], seed used as its raw state.
    Lcg,
}

impl std::fmt::Display for RngKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Std => write!(f, "std"),
            Self::Lcg => write!(f, "lcg"),
        }
    }
}

impl std::str::FromStr for RngKind {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "std" | "stdrng" => Ok(Self::Std),
            "lcg" | "lcg48" => Ok(Self::Lcg),
            other => Err(Error::UnknownRng(other.to_string())),
        }
    }
}

/// Validated experiment parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub run_length: usize,
    pub policy: ModePolicy,
    pub seed: u64,
    /// Worker threads per run; 1 keeps generation on the calling thread.
    pub shards: usize,
}

impl ExperimentConfig {
    pub fn builder() -> ExperimentConfigBuilder {
        ExperimentConfigBuilder::default()
    }

    /// Run length and shard count must both be positive. [`Experiment`]
    /// re-checks this before every run.
    pub fn validate(&self) -> Result<()> {
        if self.run_length == 0 {
            return Err(Error::InvalidRunLength(self.run_length));
        }
        if self.shards == 0 {
            return Err(Error::InvalidShardCount);
        }
        Ok(())
    }
}

/// Builder for [`ExperimentConfig`]. `build` fails if no policy was given.
#[derive(Debug, Clone, Default)]
pub struct ExperimentConfigBuilder {
    run_length: Option<usize>,
    policy: Option<ModePolicy>,
    seed: Option<u64>,
    shards: Option<usize>,
}

impl ExperimentConfigBuilder {
    pub fn run_length(mut self, run_length: usize) -> Self {
        self.run_length = Some(run_length);
        self
    }

    pub fn policy(mut self, policy: ModePolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn shards(mut self, shards: usize) -> Self {
        self.shards = Some(shards);
        self
    }

    pub fn build(self) -> Result<ExperimentConfig> {
        let policy = self.policy.ok_or(Error::MissingPolicy)?;
        let config = ExperimentConfig {
            run_length: self.run_length.unwrap_or(DEFAULT_RUN_LENGTH),
            policy,
            seed: self.seed.unwrap_or(DEFAULT_SEED),
            shards: self.shards.unwrap_or(1),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Sampling engine owning its random source.
#[derive(Debug, Clone)]
pub struct Experiment<R = StdRng> {
    config: ExperimentConfig,
    rng: R,
}

impl Experiment<StdRng> {
    /// Engine driven by `StdRng::seed_from_u64(config.seed)`.
    pub fn new(config: ExperimentConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self::with_rng(config, rng)
    }
}

impl Experiment<Lcg48> {
    /// Engine driven by the reference LCG with `config.seed` as raw state.
    pub fn with_lcg(config: ExperimentConfig) -> Self {
        let rng = Lcg48::seed_from_u64(config.seed);
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> Experiment<R> {
    /// Engine driven by a caller-supplied random source.
    pub fn with_rng(config: ExperimentConfig, rng: R) -> Self {
        Self { config, rng }
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Materialized trials for one run.
    pub fn outcomes(&mut self, phi1: f64, phi2: f64) -> Result<Vec<OutcomePair>> {
        generator::generate(
            phi1,
            phi2,
            self.config.run_length,
            self.config.policy,
            &mut self.rng,
        )
    }

    /// Fresh frequency table for one run.
    pub fn table(&mut self, phi1: f64, phi2: f64) -> Result<FrequencyTable> {
        self.config.validate()?;
        log::debug!(
            "run: phi1={phi1:.4} phi2={phi2:.4} n={} policy={} shards={}",
            self.config.run_length,
            self.config.policy,
            self.config.shards
        );
        if self.config.shards > 1 {
            return self.sharded_table(phi1, phi2);
        }
        let mut table = FrequencyTable::new(self.config.policy);
        generator::count_into(
            &mut table,
            phi1,
            phi2,
            self.config.run_length,
            &mut self.rng,
        )?;
        Ok(table)
    }

    /// Raw correlation estimate from one fresh run.
    pub fn estimate(&mut self, phi1: f64, phi2: f64) -> Result<f64> {
        let table = self.table(phi1, phi2)?;
        estimator::estimate(&table, phi1, phi2)
    }

    /// Like [`Experiment::estimate`], keeping every intermediate value.
    pub fn estimate_detailed(&mut self, phi1: f64, phi2: f64) -> Result<CorrelationEstimate> {
        let table = self.table(phi1, phi2)?;
        estimator::estimate_detailed(&table, phi1, phi2)
    }

    /// Split the run across `config.shards` scoped threads. Each shard gets
    /// its own `StdRng` seeded from the master source, so the merged table is
    /// reproducible for a given seed and shard count.
    fn sharded_table(&mut self, phi1: f64, phi2: f64) -> Result<FrequencyTable> {
        let shards = self.config.shards;
        let policy = self.config.policy;
        let base = self.config.run_length / shards;
        let extra = self.config.run_length % shards;
        let plan: Vec<(usize, u64)> = (0..shards)
            .map(|i| (base + usize::from(i < extra), self.rng.random::<u64>()))
            .filter(|&(len, _)| len > 0)
            .collect();

        let partials: Vec<Result<FrequencyTable>> = std::thread::scope(|s| {
            let handles: Vec<_> = plan
                .iter()
                .enumerate()
                .map(|(i, &(len, seed))| {
                    s.spawn(move || -> Result<FrequencyTable> {
                        log::trace!("shard {i}: {len} trials");
                        let mut rng = StdRng::seed_from_u64(seed);
                        let mut table = FrequencyTable::new(policy);
                        generator::count_into(&mut table, phi1, phi2, len, &mut rng)?;
                        Ok(table)
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect()
        });

        let mut merged = FrequencyTable::new(policy);
        for partial in partials {
            merged.merge(&partial?)?;
        }
        Ok(merged)
    }
}
