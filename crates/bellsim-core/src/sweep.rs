//! Fixed-difference angle sweeps.
//!
//! A sweep holds `φ2 − φ1 = Δφ` constant and steps φ1 through
//! `i · π/16` for `i = 0..=32` (two full half-turns), estimating the
//! correlation independently at each point. The expected curve is flat at
//! cos(2Δφ); deviations show sampling noise or a broken sign injection.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, check_angle};
use crate::estimator::nominal_correlation;
use crate::experiment::Experiment;
use crate::model::ModePolicy;

/// Points per sweep.
pub const SWEEP_POINTS: usize = 33;

/// φ1 step between sweep points.
pub const SWEEP_STEP: f64 = std::f64::consts::PI / 16.0;

/// One sweep row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub phi1: f64,
    pub phi2: f64,
    pub estimate: f64,
    /// cos(2(φ1 − φ2)), for comparison only.
    pub nominal: f64,
}

impl SweepPoint {
    pub fn error(&self) -> f64 {
        self.estimate - self.nominal
    }
}

/// Full sweep result, serializable for offline comparison between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub delta: f64,
    pub policy: ModePolicy,
    pub run_length: usize,
    pub seed: u64,
    pub points: Vec<SweepPoint>,
}

impl SweepReport {
    /// Largest |estimate − nominal| over the sweep.
    pub fn max_abs_error(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.error().abs())
            .fold(0.0, f64::max)
    }

    /// Mean of the raw estimates.
    pub fn mean_estimate(&self) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        self.points.iter().map(|p| p.estimate).sum::<f64>() / self.points.len() as f64
    }

    pub fn write_json(&self, path: &Path) -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()
    }

    pub fn read_json(path: &Path) -> std::io::Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

impl<R: Rng> Experiment<R> {
    /// Estimate the correlation at every sweep point for a fixed `delta`.
    pub fn sweep(&mut self, delta: f64) -> Result<SweepReport> {
        check_angle("delta", delta)?;
        let config = *self.config();
        log::debug!(
            "sweep: delta={delta:.4} points={SWEEP_POINTS} n={}",
            config.run_length
        );

        let mut points = Vec::with_capacity(SWEEP_POINTS);
        for i in 0..SWEEP_POINTS {
            let phi1 = i as f64 * SWEEP_STEP;
            let phi2 = phi1 + delta;
            let estimate = self.estimate(phi1, phi2)?;
            points.push(SweepPoint {
                phi1,
                phi2,
                estimate,
                nominal: nominal_correlation(phi1, phi2),
            });
        }

        Ok(SweepReport {
            delta,
            policy: config.policy,
            run_length: config.run_length,
            seed: config.seed,
            points,
        })
    }
}
