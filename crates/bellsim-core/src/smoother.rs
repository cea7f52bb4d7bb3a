//! Single-pole low-pass filter for display-rate smoothing.
//!
//! The coefficient is fixed at construction from the cutoff frequency and a
//! *nominal* update interval: `α = 1 − exp(−2π · f_c · Δt)`. It is not
//! re-derived from the real time between calls, so the filter behaves as
//! designed only when `update` runs at a roughly constant rate. With
//! `Δt = 1` (one tick) the coefficient is `1 − exp(−2π · f_c)` and the time
//! constant is `1 / (2π · f_c)` update calls.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Exponential smoother with a fixed per-update coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LowpassSmoother {
    cutoff_hz: f64,
    nominal_interval_secs: f64,
    alpha: f64,
}

impl LowpassSmoother {
    /// Build a smoother for `cutoff_hz` updated every `nominal_interval_secs`.
    pub fn new(cutoff_hz: f64, nominal_interval_secs: f64) -> Result<Self> {
        if !(cutoff_hz.is_finite() && cutoff_hz > 0.0) {
            return Err(Error::InvalidCutoff(cutoff_hz));
        }
        if !(nominal_interval_secs.is_finite() && nominal_interval_secs > 0.0) {
            return Err(Error::InvalidInterval(nominal_interval_secs));
        }
        let alpha = -(-cutoff_hz * std::f64::consts::TAU * nominal_interval_secs).exp_m1();
        Ok(Self {
            cutoff_hz,
            nominal_interval_secs,
            alpha,
        })
    }

    /// Per-update blend coefficient in `[0, 1]`. It rounds to 1 once
    /// `cutoff · Δt` is large (about 6 and up) and to 0 only if that product
    /// underflows.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn cutoff_hz(&self) -> f64 {
        self.cutoff_hz
    }

    pub fn nominal_interval_secs(&self) -> f64 {
        self.nominal_interval_secs
    }

    /// Time constant measured in update calls.
    pub fn time_constant_updates(&self) -> f64 {
        1.0 / (std::f64::consts::TAU * self.cutoff_hz * self.nominal_interval_secs)
    }

    /// `previous + α · (raw − previous)`.
    pub fn update(&self, previous: f64, raw: f64) -> f64 {
        previous + self.alpha * (raw - previous)
    }

    /// Fold `raw` into `state` and return the new smoothed value.
    pub fn apply(&self, state: &mut SmoothedEstimate, raw: f64) -> f64 {
        state.0 = self.update(state.0, raw);
        state.0
    }

    /// Updates needed for a constant input to close all but `epsilon` of the
    /// initial gap: the smallest `n` with `(1 − α)^n ≤ epsilon`.
    ///
    /// Returns `u64::MAX` when no such `n` exists: a filter with `α = 0`, or a
    /// non-positive `epsilon` with `α < 1`.
    pub fn updates_to_settle(&self, epsilon: f64) -> u64 {
        if epsilon >= 1.0 {
            return 0;
        }
        if self.alpha >= 1.0 {
            return 1;
        }
        if self.alpha <= 0.0 || !(epsilon > 0.0) {
            return u64::MAX;
        }
        let per_update = (-self.alpha).ln_1p();
        (epsilon.ln() / per_update).ceil().max(1.0) as u64
    }
}

/// The one value that persists across display ticks.
///
/// Only [`LowpassSmoother::apply`] can change it after construction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SmoothedEstimate(f64);

impl SmoothedEstimate {
    pub fn new(initial: f64) -> Self {
        Self(initial)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}
