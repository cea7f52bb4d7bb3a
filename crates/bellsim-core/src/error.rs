//! Error type shared by every engine entry point.
//!
//! The algorithm itself cannot fail once its inputs are valid, so every
//! variant here is an argument or configuration problem detected before any
//! sampling or division happens.

use thiserror::Error;

use crate::model::ModePolicy;

/// All errors generated in `bellsim-core`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("run length must be positive, got {0}")]
    InvalidRunLength(usize),

    #[error("frequency table is empty; at least one trial is required to form frequencies")]
    EmptyTable,

    #[error("mode-correlation policy not specified (expected `shared` or `complementary`)")]
    MissingPolicy,

    #[error("unknown mode-correlation policy: {0:?} (expected `shared` or `complementary`)")]
    UnknownPolicy(String),

    #[error("unknown random source: {0:?} (expected `std` or `lcg`)")]
    UnknownRng(String),

    #[error("angle {name} must be finite, got {value}")]
    NonFiniteAngle { name: &'static str, value: f64 },

    #[error("low-pass cutoff frequency must be finite and positive, got {0}")]
    InvalidCutoff(f64),

    #[error("nominal update interval must be finite and positive, got {0}")]
    InvalidInterval(f64),

    #[error("shard count must be at least 1")]
    InvalidShardCount,

    #[error("frequency table total would exceed u64::MAX trials")]
    CountOverflow,

    #[error("cannot merge frequency tables accumulated under {left} and {right} policies")]
    PolicyMismatch { left: ModePolicy, right: ModePolicy },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Reject NaN and infinite angles; any finite value is accepted unnormalized.
pub(crate) fn check_angle(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::NonFiniteAngle { name, value })
    }
}
