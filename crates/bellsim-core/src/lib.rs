//! # bellsim-core
//!
//! **Correlation from counts alone.**
//!
//! `bellsim-core` simulates a two-channel correlated-detection experiment.
//! Two angles set per-channel detection probabilities, a hidden per-trial
//! mode couples the channels, and the tallied outcomes are used to rebuild an
//! estimate of cos(2(φ1 − φ2)) without ever evaluating it from the angles.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bellsim_core::{Experiment, ExperimentConfig, ModePolicy};
//!
//! let config = ExperimentConfig::builder()
//!     .policy(ModePolicy::Shared)
//!     .run_length(10_000)
//!     .seed(0)
//!     .build()
//!     .unwrap();
//!
//! let mut experiment = Experiment::new(config);
//! let rho = experiment.estimate(0.0, std::f64::consts::FRAC_PI_8).unwrap();
//! println!("estimate = {rho:.4}");
//! ```
//!
//! ## Architecture
//!
//! Angles + random source → Generator → Outcome pairs → FrequencyTable →
//! Estimator → raw estimate → LowpassSmoother → smoothed estimate
//!
//! Two mode-correlation policies are supported and neither is a default:
//! - **Shared**: both channels see the same mode.
//! - **Complementary**: channel 2 sees the opposite mode.
//!
//! Sampled frequencies only determine squared amplitudes. The estimator takes
//! their square roots and restores each sign from the known angles (see
//! [`estimator::SignPattern`]) before applying the angle-difference and
//! double-angle identities.

pub mod error;
pub mod estimator;
pub mod experiment;
pub mod frequency;
pub mod generator;
pub mod lcg;
pub mod model;
pub mod smoother;
pub mod sweep;
pub mod tracker;

pub use error::{Error, Result};
pub use estimator::{
    CorrelationEstimate, SignPattern, cosine_sign, estimate, estimate_detailed,
    nominal_correlation, sine_sign,
};
pub use experiment::{
    DEFAULT_RUN_LENGTH, DEFAULT_SEED, Experiment, ExperimentConfig, ExperimentConfigBuilder,
    RngKind,
};
pub use frequency::{BIN_COUNT, FrequencyTable, TrigSquares};
pub use generator::{bin_probability, count_into, detection_probability, draw_trial, generate};
pub use lcg::Lcg48;
pub use model::{Channel, DetectorTag, Mode, ModePolicy, OutcomePair};
pub use smoother::{LowpassSmoother, SmoothedEstimate};
pub use sweep::{SWEEP_POINTS, SWEEP_STEP, SweepPoint, SweepReport};
pub use tracker::{AngleSchedule, TickReport, Tracker};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
