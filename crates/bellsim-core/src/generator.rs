//! Stochastic trial generation.
//!
//! Each trial draws channel 1's mode with probability 1/2, derives channel 2's
//! mode from the [`ModePolicy`], and then tags each channel independently:
//! PLUS with probability cos²(φ) under mode A, sin²(φ) under mode B.
//!
//! The channels never exchange information. Their correlation comes only from
//! the shared (or complemented) mode. Draw order per trial is fixed: mode,
//! channel 1, channel 2.

use rand::Rng;

use crate::error::{Error, Result, check_angle};
use crate::frequency::FrequencyTable;
use crate::model::{DetectorTag, Mode, ModePolicy, OutcomePair};

/// Probability that a channel at `angle` reports PLUS under `mode`.
pub fn detection_probability(angle: f64, mode: Mode) -> f64 {
    match mode {
        Mode::A => angle.cos().powi(2),
        Mode::B => angle.sin().powi(2),
    }
}

/// Exact model probability of one joint bin `(mode, tag1, tag2)`, where
/// `mode` is channel 1's mode.
pub fn bin_probability(
    policy: ModePolicy,
    phi1: f64,
    phi2: f64,
    mode: Mode,
    tag1: DetectorTag,
    tag2: DetectorTag,
) -> f64 {
    let p1 = detection_probability(phi1, mode);
    let p2 = detection_probability(phi2, policy.second_mode(mode));
    let side = |p: f64, tag: DetectorTag| match tag {
        DetectorTag::Plus => p,
        DetectorTag::Minus => 1.0 - p,
    };
    0.5 * side(p1, tag1) * side(p2, tag2)
}

/// Per-run constants: squared trig values of both angles.
#[derive(Debug, Clone, Copy)]
struct ChannelOdds {
    cos2: [f64; 2],
    sin2: [f64; 2],
}

impl ChannelOdds {
    fn new(phi1: f64, phi2: f64) -> Self {
        Self {
            cos2: [phi1.cos().powi(2), phi2.cos().powi(2)],
            sin2: [phi1.sin().powi(2), phi2.sin().powi(2)],
        }
    }

    fn plus_probability(&self, channel: usize, mode: Mode) -> f64 {
        match mode {
            Mode::A => self.cos2[channel],
            Mode::B => self.sin2[channel],
        }
    }
}

fn draw_tag<R: Rng + ?Sized>(probability: f64, rng: &mut R) -> DetectorTag {
    let r: f64 = rng.random();
    if r < probability {
        DetectorTag::Plus
    } else {
        DetectorTag::Minus
    }
}

fn draw_with<R: Rng + ?Sized>(odds: &ChannelOdds, policy: ModePolicy, rng: &mut R) -> OutcomePair {
    let r: f64 = rng.random();
    let mode1 = if r < 0.5 { Mode::A } else { Mode::B };
    let mode2 = policy.second_mode(mode1);
    let tag1 = draw_tag(odds.plus_probability(0, mode1), rng);
    let tag2 = draw_tag(odds.plus_probability(1, mode2), rng);
    OutcomePair::new(mode1, tag1, tag2)
}

/// Draw a single trial.
pub fn draw_trial<R: Rng + ?Sized>(
    phi1: f64,
    phi2: f64,
    policy: ModePolicy,
    rng: &mut R,
) -> OutcomePair {
    draw_with(&ChannelOdds::new(phi1, phi2), policy, rng)
}

/// Generate `run_length` trials.
///
/// Fails with [`Error::InvalidRunLength`] when `run_length` is zero and with
/// [`Error::NonFiniteAngle`] for NaN or infinite angles.
pub fn generate<R: Rng + ?Sized>(
    phi1: f64,
    phi2: f64,
    run_length: usize,
    policy: ModePolicy,
    rng: &mut R,
) -> Result<Vec<OutcomePair>> {
    validate(phi1, phi2, run_length)?;
    let odds = ChannelOdds::new(phi1, phi2);
    Ok((0..run_length)
        .map(|_| draw_with(&odds, policy, rng))
        .collect())
}

/// Generate `run_length` trials straight into `table`, under the table's
/// policy, without materializing the outcome vector.
pub fn count_into<R: Rng + ?Sized>(
    table: &mut FrequencyTable,
    phi1: f64,
    phi2: f64,
    run_length: usize,
    rng: &mut R,
) -> Result<()> {
    validate(phi1, phi2, run_length)?;
    let odds = ChannelOdds::new(phi1, phi2);
    let policy = table.policy();
    for _ in 0..run_length {
        table.record(&draw_with(&odds, policy, rng));
    }
    Ok(())
}

fn validate(phi1: f64, phi2: f64, run_length: usize) -> Result<()> {
    check_angle("phi1", phi1)?;
    check_angle("phi2", phi2)?;
    if run_length == 0 {
        return Err(Error::InvalidRunLength(run_length));
    }
    Ok(())
}
