//! Headless display-loop driver.
//!
//! Rotates both channels together at a constant angular speed with a fixed
//! offset, re-estimates the correlation on every tick and feeds the raw value
//! through the low-pass filter. The tracker owns the [`SmoothedEstimate`]
//! and is its only writer.

use std::f64::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, check_angle};
use crate::experiment::Experiment;
use crate::smoother::{LowpassSmoother, SmoothedEstimate};

/// `φ1 = k·t mod 2π`, `φ2 = (k·t + Δφ) mod 2π`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleSchedule {
    /// Angular speed `k` in radians per second.
    pub speed: f64,
    /// Fixed offset `Δφ = φ2 − φ1`.
    pub delta: f64,
}

impl AngleSchedule {
    pub fn new(speed: f64, delta: f64) -> Result<Self> {
        check_angle("speed", speed)?;
        check_angle("delta", delta)?;
        Ok(Self { speed, delta })
    }

    /// Both angles at time `t`, each normalized into `[0, 2π)`.
    pub fn angles_at(&self, t: f64) -> (f64, f64) {
        let base = self.speed * t;
        (base.rem_euclid(TAU), (base + self.delta).rem_euclid(TAU))
    }
}

/// What one tick produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: u64,
    pub time: f64,
    pub phi1: f64,
    pub phi2: f64,
    pub raw: f64,
    pub smoothed: f64,
}

/// Per-tick estimate-and-smooth loop.
#[derive(Debug, Clone)]
pub struct Tracker<R> {
    experiment: Experiment<R>,
    schedule: AngleSchedule,
    smoother: LowpassSmoother,
    smoothed: SmoothedEstimate,
    time: f64,
    ticks: u64,
}

impl<R: Rng> Tracker<R> {
    /// Start at `t = 0` with the smoothed value at 0.
    pub fn new(experiment: Experiment<R>, schedule: AngleSchedule, smoother: LowpassSmoother) -> Self {
        Self {
            experiment,
            schedule,
            smoother,
            smoothed: SmoothedEstimate::default(),
            time: 0.0,
            ticks: 0,
        }
    }

    /// Advance the clock by `dt` seconds, then estimate at the new angles and
    /// fold the estimate into the smoothed value.
    ///
    /// `dt` moves the angles only; the filter coefficient stays at its
    /// nominal value whatever `dt` is.
    pub fn tick(&mut self, dt: f64) -> Result<TickReport> {
        if !(dt.is_finite() && dt >= 0.0) {
            return Err(Error::InvalidInterval(dt));
        }
        self.time += dt;
        let (phi1, phi2) = self.schedule.angles_at(self.time);
        let raw = self.experiment.estimate(phi1, phi2)?;
        let smoothed = self.smoother.apply(&mut self.smoothed, raw);
        self.ticks += 1;
        log::trace!(
            "tick {}: t={:.3} phi1={phi1:.4} phi2={phi2:.4} raw={raw:+.5} smoothed={smoothed:+.5}",
            self.ticks,
            self.time
        );

        Ok(TickReport {
            tick: self.ticks,
            time: self.time,
            phi1,
            phi2,
            raw,
            smoothed,
        })
    }

    /// Tick at the smoother's nominal interval.
    pub fn tick_nominal(&mut self) -> Result<TickReport> {
        self.tick(self.smoother.nominal_interval_secs())
    }

    pub fn smoothed(&self) -> f64 {
        self.smoothed.value()
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn schedule(&self) -> &AngleSchedule {
        &self.schedule
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::ExperimentConfig;
    use crate::model::ModePolicy;
    use rand::rngs::StdRng;
    use std::f64::consts::{FRAC_PI_4, FRAC_PI_8, PI};

    fn tracker(policy: ModePolicy, delta: f64, cutoff: f64) -> Tracker<StdRng> {
        let experiment = Experiment::new(
            ExperimentConfig::builder()
                .policy(policy)
                .run_length(10_000)
                .seed(0)
                .build()
                .unwrap(),
        );
        Tracker::new(
            experiment,
            AngleSchedule::new(1.0, delta).unwrap(),
            LowpassSmoother::new(cutoff, 1.0 / 30.0).unwrap(),
        )
    }

    #[test]
    fn test_schedule_wraps_into_unit_circle() {
        let schedule = AngleSchedule::new(1.0, FRAC_PI_8).unwrap();
        let (phi1, phi2) = schedule.angles_at(2.0 * TAU + 0.5);
        assert!((phi1 - 0.5).abs() < 1e-9);
        assert!((phi2 - (0.5 + FRAC_PI_8)).abs() < 1e-9);

        let (phi1, phi2) = AngleSchedule::new(1.0, -PI).unwrap().angles_at(0.25);
        assert!((0.0..TAU).contains(&phi1));
        assert!((0.0..TAU).contains(&phi2));
        assert!((phi2 - (0.25 - PI).rem_euclid(TAU)).abs() < 1e-12);
    }

    #[test]
    fn test_schedule_rejects_non_finite() {
        assert!(AngleSchedule::new(f64::NAN, 0.0).is_err());
        assert!(AngleSchedule::new(1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_tick_advances_clock_and_counts() {
        let mut t = tracker(ModePolicy::Shared, FRAC_PI_8, 0.5);
        let first = t.tick(0.1).unwrap();
        let second = t.tick(0.1).unwrap();
        assert_eq!(first.tick, 1);
        assert_eq!(second.tick, 2);
        assert!((t.time() - 0.2).abs() < 1e-12);
        assert_eq!(t.ticks(), 2);
        assert_eq!(t.smoothed(), second.smoothed);
    }

    #[test]
    fn test_tick_rejects_negative_dt() {
        let mut t = tracker(ModePolicy::Shared, 0.0, 0.5);
        assert_eq!(t.tick(-1.0), Err(Error::InvalidInterval(-1.0)));
        assert_eq!(t.ticks(), 0);
    }

    #[test]
    fn test_smoothed_settles_on_constant_correlation() {
        // Δφ is fixed, so the nominal correlation is constant over the loop.
        for (policy, delta) in [
            (ModePolicy::Shared, FRAC_PI_8),
            (ModePolicy::Complementary, FRAC_PI_4),
        ] {
            let mut t = tracker(policy, delta, 2.0);
            for _ in 0..90 {
                t.tick_nominal().unwrap();
            }
            let want = (2.0 * delta).cos();
            assert!(
                (t.smoothed() - want).abs() < 0.03,
                "{policy}: smoothed {} vs {want}",
                t.smoothed()
            );
        }
    }

    #[test]
    fn test_smoothed_is_less_noisy_than_raw() {
        let mut t = tracker(ModePolicy::Shared, FRAC_PI_8, 0.5);
        for _ in 0..200 {
            t.tick_nominal().unwrap();
        }
        let want = FRAC_PI_4.cos();
        let (mut raw_dev, mut smooth_dev) = (0.0_f64, 0.0_f64);
        for _ in 0..100 {
            let r = t.tick_nominal().unwrap();
            raw_dev = raw_dev.max((r.raw - want).abs());
            smooth_dev = smooth_dev.max((r.smoothed - want).abs());
        }
        assert!(smooth_dev < raw_dev, "smoothed {smooth_dev} raw {raw_dev}");
    }
}
