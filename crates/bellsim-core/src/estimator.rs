//! Correlation reconstruction from sampled frequencies.
//!
//! Frequencies only ever see squared amplitudes, so the four squared-trig
//! sums give magnitudes of cos·cos, cos·sin, sin·cos and sin·sin but not
//! their signs. Signs come from the known angle settings via [`SignPattern`],
//! which never looks at sampled data. The reconstruction then goes through
//! the angle-difference identities
//!
//! ```text
//! c12 = cc·√(c²c²) + ss·√(s²s²)   ≈ cos(φ1 − φ2)
//! s12 = sc·√(s²c²) − cs·√(c²s²)   ≈ sin(φ1 − φ2)
//! ρ   = c12² − s12²               ≈ cos(2(φ1 − φ2))
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, check_angle};
use crate::frequency::{FrequencyTable, TrigSquares};
use crate::model::ModePolicy;

/// −1 when cos(φ) is negative, +1 otherwise.
pub fn cosine_sign(phi: f64) -> f64 {
    if phi.cos() < 0.0 { -1.0 } else { 1.0 }
}

/// −1 when sin(φ) is negative, +1 otherwise.
pub fn sine_sign(phi: f64) -> f64 {
    if phi.sin() < 0.0 { -1.0 } else { 1.0 }
}

/// Signs of the four cross products, a pure function of the two angles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignPattern {
    pub cc: f64,
    pub cs: f64,
    pub sc: f64,
    pub ss: f64,
}

impl SignPattern {
    pub fn for_angles(phi1: f64, phi2: f64) -> Self {
        let (c1, s1) = (cosine_sign(phi1), sine_sign(phi1));
        let (c2, s2) = (cosine_sign(phi2), sine_sign(phi2));
        Self {
            cc: c1 * c2,
            cs: c1 * s2,
            sc: s1 * c2,
            ss: s1 * s2,
        }
    }
}

/// Every intermediate of one reconstruction, for diagnostics and reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationEstimate {
    pub phi1: f64,
    pub phi2: f64,
    pub policy: ModePolicy,
    pub trials: u64,
    /// Squared-trig frequency sums after clamping to ≥ 0.
    pub squares: TrigSquares,
    pub signs: SignPattern,
    /// Reconstructed cos(φ1 − φ2).
    pub cos_diff: f64,
    /// Reconstructed sin(φ1 − φ2).
    pub sin_diff: f64,
    /// Reconstructed cos(2(φ1 − φ2)).
    pub value: f64,
}

/// Reconstructed correlation for `table` sampled at `(phi1, phi2)`.
pub fn estimate(table: &FrequencyTable, phi1: f64, phi2: f64) -> Result<f64> {
    estimate_detailed(table, phi1, phi2).map(|e| e.value)
}

/// Like [`estimate`], keeping every intermediate value.
pub fn estimate_detailed(
    table: &FrequencyTable,
    phi1: f64,
    phi2: f64,
) -> Result<CorrelationEstimate> {
    check_angle("phi1", phi1)?;
    check_angle("phi2", phi2)?;
    let squares = table.trig_squares()?.clamped();
    let signs = SignPattern::for_angles(phi1, phi2);
    let (cos_diff, sin_diff) = reconstruct(&squares, &signs);

    Ok(CorrelationEstimate {
        phi1,
        phi2,
        policy: table.policy(),
        trials: table.total(),
        squares,
        signs,
        cos_diff,
        sin_diff,
        value: cos_diff * cos_diff - sin_diff * sin_diff,
    })
}

/// `(c12, s12)` from clamped magnitudes and externally supplied signs.
pub(crate) fn reconstruct(squares: &TrigSquares, signs: &SignPattern) -> (f64, f64) {
    let cc = signs.cc * squares.cos_cos.sqrt();
    let cs = signs.cs * squares.cos_sin.sqrt();
    let sc = signs.sc * squares.sin_cos.sqrt();
    let ss = signs.ss * squares.sin_sin.sqrt();
    (cc + ss, sc - cs)
}

/// Closed-form cos(2(φ1 − φ2)). Reference value only; the estimator never
/// calls it.
pub fn nominal_correlation(phi1: f64, phi2: f64) -> f64 {
    (2.0 * (phi1 - phi2)).cos()
}
