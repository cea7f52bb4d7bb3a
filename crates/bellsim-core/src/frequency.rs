//! Eight-bin joint frequency table and the squared-trig sums derived from it.
//!
//! Bins are indexed by `(mode, tag1, tag2)` where `mode` is channel 1's mode.
//! Summing one bin from each mode gives an estimate of one product of squared
//! trig values. Which pair of bins feeds which product depends on the policy:
//!
//! ```text
//!                     Shared            Complementary
//! cos²φ1·cos²φ2     A++  +  B--        A+-  +  B-+
//! cos²φ1·sin²φ2     A+-  +  B-+        A++  +  B--
//! sin²φ1·cos²φ2     A-+  +  B+-        A--  +  B++
//! sin²φ1·sin²φ2     A--  +  B++        A-+  +  B+-
//! ```
//!
//! Under Shared, mode A gives each channel P(+) = cos² and mode B gives
//! P(+) = sin², so e.g. `P(A++) + P(B--) = ½c1²c2² + ½(1-s1²)(1-s2²)`.
//! Under Complementary channel 2 always sees the other mode, which swaps
//! channel 2's role in every row.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::DetectorTag::{Minus, Plus};
use crate::model::{Channel, DetectorTag, Mode, ModePolicy, OutcomePair};

/// Number of joint bins: 2 modes × 2 tags × 2 tags.
pub const BIN_COUNT: usize = 8;

type Bin = (Mode, DetectorTag, DetectorTag);

/// Bin pairs for (cos·cos, cos·sin, sin·cos, sin·sin), in that order.
const SHARED_SUMS: [[Bin; 2]; 4] = [
    [(Mode::A, Plus, Plus), (Mode::B, Minus, Minus)],
    [(Mode::A, Plus, Minus), (Mode::B, Minus, Plus)],
    [(Mode::A, Minus, Plus), (Mode::B, Plus, Minus)],
    [(Mode::A, Minus, Minus), (Mode::B, Plus, Plus)],
];

const COMPLEMENTARY_SUMS: [[Bin; 2]; 4] = [
    [(Mode::A, Plus, Minus), (Mode::B, Minus, Plus)],
    [(Mode::A, Plus, Plus), (Mode::B, Minus, Minus)],
    [(Mode::A, Minus, Minus), (Mode::B, Plus, Plus)],
    [(Mode::A, Minus, Plus), (Mode::B, Plus, Minus)],
];

fn bin_index(mode: Mode, tag1: DetectorTag, tag2: DetectorTag) -> usize {
    mode.index() * 4 + tag1.index() * 2 + tag2.index()
}

fn checked_total(counts: &[u64; BIN_COUNT]) -> Result<u64> {
    counts
        .iter()
        .try_fold(0u64, |acc, &c| acc.checked_add(c))
        .ok_or(Error::CountOverflow)
}

/// Frequency estimates of the four squared-trig products.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrigSquares {
    /// ≈ cos²φ1 · cos²φ2
    pub cos_cos: f64,
    /// ≈ cos²φ1 · sin²φ2
    pub cos_sin: f64,
    /// ≈ sin²φ1 · cos²φ2
    pub sin_cos: f64,
    /// ≈ sin²φ1 · sin²φ2
    pub sin_sin: f64,
}

impl TrigSquares {
    /// Clamp every component to be non-negative.
    pub fn clamped(self) -> Self {
        Self {
            cos_cos: self.cos_cos.max(0.0),
            cos_sin: self.cos_sin.max(0.0),
            sin_cos: self.sin_cos.max(0.0),
            sin_sin: self.sin_sin.max(0.0),
        }
    }
}

/// Counts of trials per `(mode, tag1, tag2)` bin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyTable {
    policy: ModePolicy,
    counts: [u64; BIN_COUNT],
}

impl FrequencyTable {
    /// Empty table for trials generated under `policy`.
    pub fn new(policy: ModePolicy) -> Self {
        Self {
            policy,
            counts: [0; BIN_COUNT],
        }
    }

    /// Table from raw counts in bin order `A++ A+- A-+ A-- B++ B+- B-+ B--`.
    ///
    /// Fails with [`Error::CountOverflow`] if the counts sum past `u64::MAX`.
    pub fn from_counts(policy: ModePolicy, counts: [u64; BIN_COUNT]) -> Result<Self> {
        checked_total(&counts)?;
        Ok(Self { policy, counts })
    }

    /// Count `outcomes` into a fresh table.
    pub fn accumulate(policy: ModePolicy, outcomes: &[OutcomePair]) -> Self {
        let mut table = Self::new(policy);
        for pair in outcomes {
            table.record(pair);
        }
        table
    }

    /// Count one trial.
    pub fn record(&mut self, pair: &OutcomePair) {
        self.counts[bin_index(pair.mode, pair.tag1, pair.tag2)] += 1;
    }

    /// Policy the counted trials were generated under.
    pub fn policy(&self) -> ModePolicy {
        self.policy
    }

    /// Raw counts in bin order `A++ A+- A-+ A-- B++ B+- B-+ B--`.
    pub fn counts(&self) -> &[u64; BIN_COUNT] {
        &self.counts
    }

    pub fn count(&self, mode: Mode, tag1: DetectorTag, tag2: DetectorTag) -> u64 {
        self.counts[bin_index(mode, tag1, tag2)]
    }

    /// Total number of trials counted.
    ///
    /// Cannot overflow: `from_counts` and `merge` keep the sum within `u64`,
    /// and `record` adds one trial at a time.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Trials whose channel-1 mode was `mode`.
    pub fn mode_count(&self, mode: Mode) -> u64 {
        let start = mode.index() * 4;
        self.counts[start..start + 4].iter().sum()
    }

    /// Trials where `channel` reported PLUS, over both modes.
    pub fn plus_count(&self, channel: Channel) -> u64 {
        let mut plus = 0;
        for mode in [Mode::A, Mode::B] {
            for other in [Plus, Minus] {
                plus += match channel {
                    Channel::One => self.count(mode, Plus, other),
                    Channel::Two => self.count(mode, other, Plus),
                };
            }
        }
        plus
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Fraction of trials that landed in one bin.
    pub fn frequency(&self, mode: Mode, tag1: DetectorTag, tag2: DetectorTag) -> Result<f64> {
        let total = self.nonzero_total()?;
        Ok(self.count(mode, tag1, tag2) as f64 / total)
    }

    /// Elementwise sum with another table of the same policy.
    ///
    /// On error `self` is left unchanged.
    pub fn merge(&mut self, other: &FrequencyTable) -> Result<()> {
        if self.policy != other.policy {
            return Err(Error::PolicyMismatch {
                left: self.policy,
                right: other.policy,
            });
        }
        self.total()
            .checked_add(other.total())
            .ok_or(Error::CountOverflow)?;
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts.iter()) {
            *mine += theirs;
        }
        Ok(())
    }

    /// Fraction of trials where `channel` reported PLUS, over both modes.
    pub fn marginal_plus_fraction(&self, channel: Channel) -> Result<f64> {
        let total = self.nonzero_total()?;
        Ok(self.plus_count(channel) as f64 / total)
    }

    /// The four squared-trig frequency sums under this table's policy.
    pub fn trig_squares(&self) -> Result<TrigSquares> {
        self.trig_squares_under(self.policy)
    }

    pub(crate) fn trig_squares_under(&self, policy: ModePolicy) -> Result<TrigSquares> {
        let total = self.nonzero_total()?;
        let layout = match policy {
            ModePolicy::Shared => &SHARED_SUMS,
            ModePolicy::Complementary => &COMPLEMENTARY_SUMS,
        };
        let sum = |row: &[Bin; 2]| {
            row.iter()
                .map(|&(mode, t1, t2)| self.count(mode, t1, t2))
                .sum::<u64>() as f64
                / total
        };
        Ok(TrigSquares {
            cos_cos: sum(&layout[0]),
            cos_sin: sum(&layout[1]),
            sin_cos: sum(&layout[2]),
            sin_sin: sum(&layout[3]),
        })
    }

    fn nonzero_total(&self) -> Result<f64> {
        match self.total() {
            0 => Err(Error::EmptyTable),
            n => Ok(n as f64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{bin_probability, generate};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn pair(mode: Mode, t1: DetectorTag, t2: DetectorTag) -> OutcomePair {
        OutcomePair::new(mode, t1, t2)
    }

    #[test]
    fn test_bin_indices_are_a_partition() {
        let mut seen = [false; BIN_COUNT];
        for mode in [Mode::A, Mode::B] {
            for t1 in [Plus, Minus] {
                for t2 in [Plus, Minus] {
                    let i = bin_index(mode, t1, t2);
                    assert!(!seen[i], "bin {i} reused");
                    seen[i] = true;
                }
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_accumulate_total_equals_input_length() {
        for seed in [0, 1, 2, 99] {
            let mut rng = StdRng::seed_from_u64(seed);
            let n = 1000 + seed as usize;
            let pairs = generate(0.5, 2.0, n, ModePolicy::Shared, &mut rng).unwrap();
            let table = FrequencyTable::accumulate(ModePolicy::Shared, &pairs);
            assert_eq!(table.total(), n as u64);
        }
    }

    #[test]
    fn test_record_hits_expected_bin() {
        let mut table = FrequencyTable::new(ModePolicy::Shared);
        table.record(&pair(Mode::B, Plus, Minus));
        table.record(&pair(Mode::B, Plus, Minus));
        table.record(&pair(Mode::A, Minus, Minus));
        assert_eq!(table.count(Mode::B, Plus, Minus), 2);
        assert_eq!(table.count(Mode::A, Minus, Minus), 1);
        assert_eq!(table.counts(), &[0, 0, 0, 1, 0, 2, 0, 0]);
    }

    #[test]
    fn test_empty_table_has_no_frequencies() {
        let table = FrequencyTable::new(ModePolicy::Complementary);
        assert!(table.is_empty());
        assert_eq!(table.trig_squares(), Err(Error::EmptyTable));
        assert_eq!(
            table.marginal_plus_fraction(Channel::One),
            Err(Error::EmptyTable)
        );
        assert_eq!(table.frequency(Mode::A, Plus, Plus), Err(Error::EmptyTable));
    }

    #[test]
    fn test_merge_is_elementwise_sum() {
        let policy = ModePolicy::Shared;
        let mut rng = StdRng::seed_from_u64(5);
        let a = FrequencyTable::accumulate(
            policy,
            &generate(0.3, 0.9, 700, policy, &mut rng).unwrap(),
        );
        let b = FrequencyTable::accumulate(
            policy,
            &generate(0.3, 0.9, 300, policy, &mut rng).unwrap(),
        );

        let mut ab = a.clone();
        ab.merge(&b).unwrap();
        let mut ba = b.clone();
        ba.merge(&a).unwrap();

        assert_eq!(ab, ba);
        assert_eq!(ab.total(), 1000);
        for i in 0..BIN_COUNT {
            assert_eq!(ab.counts()[i], a.counts()[i] + b.counts()[i]);
        }
    }

    #[test]
    fn test_merge_rejects_policy_mismatch() {
        let mut shared = FrequencyTable::new(ModePolicy::Shared);
        let complementary = FrequencyTable::new(ModePolicy::Complementary);
        assert_eq!(
            shared.merge(&complementary),
            Err(Error::PolicyMismatch {
                left: ModePolicy::Shared,
                right: ModePolicy::Complementary,
            })
        );
    }

    #[test]
    fn test_marginal_plus_fraction_counts_both_modes() {
        let mut table = FrequencyTable::new(ModePolicy::Shared);
        table.record(&pair(Mode::A, Plus, Minus));
        table.record(&pair(Mode::B, Plus, Plus));
        table.record(&pair(Mode::B, Minus, Minus));
        table.record(&pair(Mode::A, Minus, Minus));
        assert_eq!(table.marginal_plus_fraction(Channel::One), Ok(0.5));
        assert_eq!(table.marginal_plus_fraction(Channel::Two), Ok(0.25));
    }

    #[test]
    fn test_sum_layouts_match_model_products() {
        // Feed exact expected bin probabilities (scaled to counts) through the
        // layout and compare against the closed-form products.
        let (phi1, phi2) = (0.37_f64, 1.91_f64);
        let (c1, s1) = (phi1.cos().powi(2), phi1.sin().powi(2));
        let (c2, s2) = (phi2.cos().powi(2), phi2.sin().powi(2));
        let scale = 1e12;

        for policy in [ModePolicy::Shared, ModePolicy::Complementary] {
            let mut counts = [0u64; BIN_COUNT];
            for mode in [Mode::A, Mode::B] {
                for t1 in [Plus, Minus] {
                    for t2 in [Plus, Minus] {
                        let p = bin_probability(policy, phi1, phi2, mode, t1, t2);
                        counts[bin_index(mode, t1, t2)] = (p * scale).round() as u64;
                    }
                }
            }
            let table = FrequencyTable::from_counts(policy, counts).unwrap();
            let sums = table.trig_squares().unwrap();
            assert!((sums.cos_cos - c1 * c2).abs() < 1e-9, "{policy}");
            assert!((sums.cos_sin - c1 * s2).abs() < 1e-9, "{policy}");
            assert!((sums.sin_cos - s1 * c2).abs() < 1e-9, "{policy}");
            assert!((sums.sin_sin - s1 * s2).abs() < 1e-9, "{policy}");
        }
    }

    #[test]
    fn test_mode_and_plus_counts() {
        let mut table = FrequencyTable::new(ModePolicy::Shared);
        table.record(&pair(Mode::A, Plus, Minus));
        table.record(&pair(Mode::B, Plus, Plus));
        table.record(&pair(Mode::B, Minus, Minus));
        assert_eq!(table.mode_count(Mode::A), 1);
        assert_eq!(table.mode_count(Mode::B), 2);
        assert_eq!(table.plus_count(Channel::One), 2);
        assert_eq!(table.plus_count(Channel::Two), 1);
    }

    #[test]
    fn test_from_counts_rejects_overflowing_total() {
        let mut counts = [0u64; BIN_COUNT];
        counts[0] = u64::MAX;
        assert!(FrequencyTable::from_counts(ModePolicy::Shared, counts).is_ok());
        counts[7] = 1;
        assert_eq!(
            FrequencyTable::from_counts(ModePolicy::Shared, counts),
            Err(Error::CountOverflow)
        );
    }

    #[test]
    fn test_merge_overflow_leaves_table_unchanged() {
        let mut counts = [0u64; BIN_COUNT];
        counts[2] = u64::MAX - 1;
        let mut big = FrequencyTable::from_counts(ModePolicy::Shared, counts).unwrap();
        let before = big.clone();

        let mut small = FrequencyTable::new(ModePolicy::Shared);
        small.record(&pair(Mode::B, Minus, Minus));
        small.record(&pair(Mode::A, Plus, Plus));
        assert_eq!(big.merge(&small), Err(Error::CountOverflow));
        assert_eq!(big, before);

        small = FrequencyTable::new(ModePolicy::Shared);
        small.record(&pair(Mode::B, Minus, Minus));
        big.merge(&small).unwrap();
        assert_eq!(big.total(), u64::MAX);
    }

    #[test]
    fn test_layouts_differ_between_policies() {
        let mut table = FrequencyTable::new(ModePolicy::Complementary);
        table.record(&pair(Mode::A, Plus, Minus));
        let own = table.trig_squares().unwrap();
        let foreign = table.trig_squares_under(ModePolicy::Shared).unwrap();
        assert_eq!(own.cos_cos, 1.0);
        assert_eq!(foreign.cos_cos, 0.0);
        assert_eq!(foreign.cos_sin, 1.0);
    }

    #[test]
    fn test_clamped_zeroes_negatives_only() {
        let sums = TrigSquares {
            cos_cos: -1e-12,
            cos_sin: 0.25,
            sin_cos: 0.0,
            sin_sin: 0.75,
        }
        .clamped();
        assert_eq!(sums.cos_cos, 0.0);
        assert_eq!(sums.cos_sin, 0.25);
        assert_eq!(sums.sin_sin, 0.75);
    }
}
