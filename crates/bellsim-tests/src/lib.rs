//! Statistical test battery for sampled frequency tables.
//!
//! Checks a [`FrequencyTable`] against the sampling model it was supposedly
//! drawn from: hidden-mode balance, per-channel marginal balance, and a
//! chi-squared goodness of fit of all eight joint bins against the model's
//! exact bin probabilities. Each test returns a [`TestResult`] with a
//! p-value, a pass/fail determination, and a letter grade (A through F).

use bellsim_core::{Channel, DetectorTag, FrequencyTable, Mode, bin_probability};
use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};
use statrs::function::erf::erfc;

// ═══════════════════════════════════════════════════════════════════════════════
// Core types
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of a single statistical test.
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub p_value: Option<f64>,
    pub statistic: f64,
    pub details: String,
    pub grade: char,
}

impl TestResult {
    /// Letter grade for a p-value: A from 0.1, then one letter per decade
    /// down to D at 1e-4. Anything lower, or no p-value at all, is F.
    pub fn grade_from_p(p: Option<f64>) -> char {
        let Some(p) = p else { return 'F' };
        [(0.1, 'A'), (0.01, 'B'), (0.001, 'C'), (0.0001, 'D')]
            .into_iter()
            .find(|&(floor, _)| p >= floor)
            .map_or('F', |(_, grade)| grade)
    }

    fn from_p(name: &str, p: f64, statistic: f64, details: String) -> Self {
        TestResult {
            name: name.to_string(),
            passed: p >= PASS_THRESHOLD,
            p_value: Some(p),
            statistic,
            details,
            grade: Self::grade_from_p(Some(p)),
        }
    }

    /// Failing result for a table below [`MIN_TRIALS`].
    fn too_few_trials(name: &str, got: u64) -> Self {
        TestResult {
            name: name.to_string(),
            passed: false,
            p_value: None,
            statistic: 0.0,
            details: format!("{got} trials, need at least {MIN_TRIALS}"),
            grade: 'F',
        }
    }

    /// Points this result contributes to [`calculate_quality_score`].
    fn score(&self) -> f64 {
        match self.grade {
            'A' => 100.0,
            'B' => 75.0,
            'C' => 50.0,
            'D' => 25.0,
            _ => 0.0,
        }
    }
}

/// p-value below which a test is reported as failed.
pub const PASS_THRESHOLD: f64 = 0.01;

/// Minimum trials before any test is attempted.
pub const MIN_TRIALS: u64 = 100;

const TAGS: [DetectorTag; 2] = [DetectorTag::Plus, DetectorTag::Minus];

// ═══════════════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════════════

/// Two-sided p-value of a fair-coin count: `successes` out of `n`.
fn fair_coin_p(successes: u64, n: u64) -> (f64, f64) {
    let n_f = n as f64;
    let z = (successes as f64 - n_f / 2.0) / (n_f / 4.0).sqrt();
    (z, erfc(z.abs() / 2.0_f64.sqrt()))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

/// Test 1: Mode balance -- channel 1's hidden mode should be A half the time.
pub fn mode_balance(table: &FrequencyTable) -> TestResult {
    let name = "Mode Balance";
    let n = table.total();
    if n < MIN_TRIALS {
        return TestResult::too_few_trials(name, n);
    }
    let mode_a = table.mode_count(Mode::A);
    let (z, p) = fair_coin_p(mode_a, n);
    TestResult::from_p(name, p, z, format!("A={mode_a}, n={n}"))
}

/// Test 2/3: Marginal balance -- each channel alone is a fair coin.
pub fn marginal_balance(table: &FrequencyTable, channel: Channel) -> TestResult {
    let name = match channel {
        Channel::One => "Marginal Balance (channel 1)",
        Channel::Two => "Marginal Balance (channel 2)",
    };
    let n = table.total();
    if n < MIN_TRIALS {
        return TestResult::too_few_trials(name, n);
    }
    let plus = table.plus_count(channel);
    let (z, p) = fair_coin_p(plus, n);
    TestResult::from_p(name, p, z, format!("plus={plus}, n={n}"))
}

/// Test 4: Joint goodness of fit -- chi-squared over the eight bins against
/// the model probabilities at `(phi1, phi2)` under the table's policy.
///
/// Bins with zero expected probability are excluded from the statistic; a
/// count in such a bin fails the test outright.
pub fn joint_goodness_of_fit(table: &FrequencyTable, phi1: f64, phi2: f64) -> TestResult {
    let name = "Joint Goodness of Fit";
    let n = table.total();
    if n < MIN_TRIALS {
        return TestResult::too_few_trials(name, n);
    }
    let policy = table.policy();
    let n_f = n as f64;
    let mut chi2 = 0.0;
    let mut live_bins = 0usize;
    let mut impossible = 0u64;

    for mode in [Mode::A, Mode::B] {
        for t1 in TAGS {
            for t2 in TAGS {
                let observed = table.count(mode, t1, t2);
                let expected = bin_probability(policy, phi1, phi2, mode, t1, t2) * n_f;
                if expected < 1e-9 {
                    impossible += observed;
                    continue;
                }
                let diff = observed as f64 - expected;
                chi2 += diff * diff / expected;
                live_bins += 1;
            }
        }
    }

    let details = format!("policy={policy}, bins={live_bins}, impossible={impossible}");
    if impossible > 0 {
        return TestResult {
            name: name.to_string(),
            passed: false,
            p_value: Some(0.0),
            statistic: f64::INFINITY,
            details,
            grade: 'F',
        };
    }
    let df = live_bins.saturating_sub(1);
    let p = if df == 0 {
        1.0
    } else {
        match ChiSquared::new(df as f64) {
            Ok(dist) => dist.sf(chi2),
            Err(_) => 0.0,
        }
    };
    log::debug!("{name}: chi2={chi2:.3} df={df} p={p:.4}");
    TestResult::from_p(name, p, chi2, details)
}

/// Run the full battery for a table sampled at `(phi1, phi2)`.
pub fn run_all_tests(table: &FrequencyTable, phi1: f64, phi2: f64) -> Vec<TestResult> {
    vec![
        mode_balance(table),
        marginal_balance(table, Channel::One),
        marginal_balance(table, Channel::Two),
        joint_goodness_of_fit(table, phi1, phi2),
    ]
}

/// Mean grade score over `results`, from 0 (all F) to 100 (all A).
pub fn calculate_quality_score(results: &[TestResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    results.iter().map(TestResult::score).sum::<f64>() / results.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use bellsim_core::{Experiment, ExperimentConfig, ModePolicy};
    use std::f64::consts::FRAC_PI_8;

    fn sampled(policy: ModePolicy, phi1: f64, phi2: f64, n: usize) -> FrequencyTable {
        Experiment::new(
            ExperimentConfig::builder()
                .policy(policy)
                .run_length(n)
                .seed(1)
                .build()
                .unwrap(),
        )
        .table(phi1, phi2)
        .unwrap()
    }

    #[test]
    fn test_grade_from_p() {
        assert_eq!(TestResult::grade_from_p(Some(0.5)), 'A');
        assert_eq!(TestResult::grade_from_p(Some(0.05)), 'B');
        assert_eq!(TestResult::grade_from_p(Some(0.005)), 'C');
        assert_eq!(TestResult::grade_from_p(Some(0.0005)), 'D');
        assert_eq!(TestResult::grade_from_p(Some(0.00000001)), 'F');
        assert_eq!(TestResult::grade_from_p(None), 'F');
    }

    #[test]
    fn test_pass_threshold() {
        assert!(TestResult::from_p("t", 0.05, 0.0, String::new()).passed);
        assert!(TestResult::from_p("t", PASS_THRESHOLD, 0.0, String::new()).passed);
        assert!(!TestResult::from_p("t", 0.005, 0.0, String::new()).passed);
    }

    #[test]
    fn test_balance_tests_use_table_counts() {
        // 60 of 100 trials in mode A, channel 1 PLUS 50 times, channel 2 PLUS 70 times.
        let counts = [30, 0, 20, 10, 10, 10, 10, 10];
        let table = FrequencyTable::from_counts(ModePolicy::Shared, counts).unwrap();
        assert_eq!(mode_balance(&table).details, "A=60, n=100");
        let one = marginal_balance(&table, Channel::One);
        assert_eq!(one.details, "plus=50, n=100");
        assert_eq!(one.statistic, 0.0);
        let two = marginal_balance(&table, Channel::Two);
        assert_eq!(two.details, "plus=70, n=100");
        assert!((two.statistic - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_fair_coin_exact_half() {
        let (z, p) = fair_coin_p(500, 1000);
        assert_eq!(z, 0.0);
        assert!((p - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_small_table_is_insufficient() {
        let table = sampled(ModePolicy::Shared, 0.0, 0.0, 10);
        for result in run_all_tests(&table, 0.0, 0.0) {
            assert!(!result.passed);
            assert!(result.p_value.is_none());
        }
    }

    #[test]
    fn test_model_data_is_not_rejected() {
        for policy in [ModePolicy::Shared, ModePolicy::Complementary] {
            let table = sampled(policy, 0.4, 0.4 + FRAC_PI_8, 50_000);
            for result in run_all_tests(&table, 0.4, 0.4 + FRAC_PI_8) {
                let p = result.p_value.unwrap();
                assert!(p > 1e-4, "{policy} {}: p={p}", result.name);
            }
        }
    }

    #[test]
    fn test_wrong_angles_are_rejected() {
        let table = sampled(ModePolicy::Shared, 0.4, 1.2, 50_000);
        let result = joint_goodness_of_fit(&table, 0.4, 0.4);
        assert!(!result.passed);
        assert!(result.p_value.unwrap() < 1e-6);
    }

    #[test]
    fn test_wrong_policy_is_rejected() {
        let table = sampled(ModePolicy::Complementary, 0.3, 0.3, 20_000);
        let relabeled = FrequencyTable::from_counts(ModePolicy::Shared, *table.counts()).unwrap();
        let result = joint_goodness_of_fit(&relabeled, 0.3, 0.3);
        assert!(!result.passed);
    }

    #[test]
    fn test_impossible_bin_fails_outright() {
        // At φ1 = φ2 = 0 under Shared only A++ and B-- can occur.
        let mut counts = [0u64; 8];
        counts[0] = 500; // A++
        counts[7] = 499; // B--
        counts[1] = 1; // A+-
        let table = FrequencyTable::from_counts(ModePolicy::Shared, counts).unwrap();
        let result = joint_goodness_of_fit(&table, 0.0, 0.0);
        assert!(!result.passed);
        assert_eq!(result.grade, 'F');
    }

    #[test]
    fn test_degenerate_bins_keep_single_df() {
        let mut counts = [0u64; 8];
        counts[0] = 500;
        counts[7] = 500;
        let table = FrequencyTable::from_counts(ModePolicy::Shared, counts).unwrap();
        let result = joint_goodness_of_fit(&table, 0.0, 0.0);
        assert!(result.passed);
        assert_eq!(result.statistic, 0.0);
    }

    #[test]
    fn test_quality_score() {
        let table = sampled(ModePolicy::Shared, 1.0, 2.0, 20_000);
        let results = run_all_tests(&table, 1.0, 2.0);
        assert_eq!(results.len(), 4);
        let score = calculate_quality_score(&results);
        assert!((0.0..=100.0).contains(&score));
        assert_eq!(calculate_quality_score(&[]), 0.0);
    }
}
