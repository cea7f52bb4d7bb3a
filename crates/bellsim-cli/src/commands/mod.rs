pub mod check;
pub mod estimate;
pub mod sweep;
pub mod track;

use bellsim_core::{DEFAULT_RUN_LENGTH, DEFAULT_SEED, ExperimentConfig, ModePolicy, RngKind};
use clap::Args;

/// Options shared by every sampling command.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Mode-correlation policy: shared or complementary (no default)
    #[arg(long)]
    pub policy: String,

    /// Trials per estimate
    #[arg(long, default_value_t = DEFAULT_RUN_LENGTH)]
    pub runs: usize,

    /// Seed for the random source
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Random source: std (StdRng) or lcg (reference 64-bit LCG)
    #[arg(long, default_value = "std")]
    pub rng: String,

    /// Split each run across this many threads
    #[arg(long, default_value = "1")]
    pub shards: usize,
}

impl RunArgs {
    /// Validated configuration and random source kind. Exits on bad input.
    pub fn resolve(&self) -> (ExperimentConfig, RngKind) {
        let policy: ModePolicy = or_exit(self.policy.parse());
        let rng: RngKind = or_exit(self.rng.parse());
        let config = or_exit(
            ExperimentConfig::builder()
                .policy(policy)
                .run_length(self.runs)
                .seed(self.seed)
                .shards(self.shards)
                .build(),
        );
        log::debug!("config: {config:?} rng={rng}");
        (config, rng)
    }
}

/// Print the error and exit with status 1.
pub fn or_exit<T, E: std::fmt::Display>(result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

pub fn write_json<T: serde::Serialize>(path: &str, value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            if let Err(e) = std::fs::write(path, json + "\n") {
                eprintln!("Failed to write {path}: {e}");
                std::process::exit(1);
            }
            println!("\nResults written to {path}");
        }
        Err(e) => {
            eprintln!("Failed to serialize results: {e}");
            std::process::exit(1);
        }
    }
}
