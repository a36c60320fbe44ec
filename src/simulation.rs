//! Monte Carlo validation of analytic power.
//!
//! Simulates many independent two-group experiments and measures how often
//! the t-test rejects at the chosen significance level. The empirical
//! rejection rate cross-checks the solver's analytic prediction; the two are
//! deliberately not wired together.
//!
//! The simulated test defaults to the Welch (unequal-variance) form while
//! the analytic formula is the textbook equal-variance one. With equal group
//! sizes and unit variances on both arms the Welch degrees of freedom
//! coincide with the pooled 2n - 2 in expectation, so the mismatch is small
//! but real; [`SimulationConfig::equal_variance`] switches the simulated
//! side rather than hiding the difference.

use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::error::PowerError;
use crate::two_sample_t_test;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Knobs for one validation run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationConfig {
    /// Number of simulated experiments. 1000 is a floor for a usable
    /// estimate; 5000 brings the standard error of the empirical power down
    /// to roughly 0.006 near power 0.8.
    pub num_runs: usize,
    /// Seed for the draw stream. With a seed the whole sequence of draws is
    /// reproducible byte for byte; without one each call is independent.
    pub seed: Option<u64>,
    /// Use the pooled (equal-variance) t-test instead of the Welch form.
    pub equal_variance: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_runs: 5000,
            seed: None,
            equal_variance: false,
        }
    }
}

/// Aggregate outcome of a batch of simulated experiments.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationSummary {
    /// Fraction of evaluated runs whose p-value fell below the significance
    /// level.
    pub empirical_power: f64,
    /// Total simulated runs, including skipped ones.
    pub runs: usize,
    /// Runs that rejected the null.
    pub rejected: usize,
    /// Runs with an undefined t statistic (zero variance in both groups),
    /// excluded from the denominator. Vanishingly rare with continuous
    /// draws.
    pub skipped: usize,
}

/// Estimate the power of a two-sample t-test empirically.
///
/// Each run draws `sample_size_per_group` observations from Normal(0, 1) for
/// group A and the same number from Normal(`effect_size`, 1) for group B, in
/// that order, run after run from a single RNG stream. A zero `effect_size`
/// is allowed here (unlike the analytic solver): it estimates the realized
/// type I error rate.
///
/// Degenerate runs are skipped and counted in
/// [`SimulationSummary::skipped`]; the call only fails with
/// [`PowerError::DegenerateSample`] if every run was degenerate.
///
/// # Errors
///
/// [`PowerError::InvalidQuery`] for out-of-domain arguments,
/// [`PowerError::DegenerateSample`] if no run produced a usable statistic.
pub fn empirical_power(
    effect_size: f64,
    sample_size_per_group: usize,
    significance_level: f64,
    config: &SimulationConfig,
) -> Result<SimulationSummary, PowerError> {
    if !effect_size.is_finite() {
        return Err(PowerError::InvalidQuery(format!(
            "effect_size must be finite, got {effect_size}"
        )));
    }
    if sample_size_per_group < 2 {
        return Err(PowerError::InvalidQuery(format!(
            "sample_size_per_group must be at least 2, got {sample_size_per_group}"
        )));
    }
    if !(significance_level > 0.0 && significance_level < 1.0) {
        return Err(PowerError::InvalidQuery(format!(
            "significance_level must lie strictly in (0, 1), got {significance_level}"
        )));
    }
    if config.num_runs == 0 {
        return Err(PowerError::InvalidQuery(
            "num_runs must be positive".to_string(),
        ));
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let control = Normal::new(0.0, 1.0).unwrap();
    let treatment = Normal::new(effect_size, 1.0).unwrap();

    let mut group_a = vec![0.0f64; sample_size_per_group];
    let mut group_b = vec![0.0f64; sample_size_per_group];
    let mut rejected = 0usize;
    let mut skipped = 0usize;

    for _ in 0..config.num_runs {
        // Draw order is part of the determinism contract: group A first,
        // then group B, one run at a time.
        for slot in group_a.iter_mut() {
            *slot = control.sample(&mut rng);
        }
        for slot in group_b.iter_mut() {
            *slot = treatment.sample(&mut rng);
        }
        match two_sample_t_test(&group_a, &group_b, config.equal_variance) {
            Ok(test) => {
                if test.p_value < significance_level {
                    rejected += 1;
                }
            }
            Err(PowerError::DegenerateSample) => skipped += 1,
            Err(e) => return Err(e),
        }
    }

    let evaluated = config.num_runs - skipped;
    if evaluated == 0 {
        return Err(PowerError::DegenerateSample);
    }
    debug!(
        "simulated {} runs at effect {effect_size}, n {sample_size_per_group}: \
         {rejected} rejections, {skipped} skipped",
        config.num_runs
    );
    Ok(SimulationSummary {
        empirical_power: rejected as f64 / evaluated as f64,
        runs: config.num_runs,
        rejected,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_arguments() {
        let config = SimulationConfig::default();
        assert!(empirical_power(f64::NAN, 10, 0.05, &config).is_err());
        assert!(empirical_power(0.5, 1, 0.05, &config).is_err());
        assert!(empirical_power(0.5, 10, 0.0, &config).is_err());

        let no_runs = SimulationConfig {
            num_runs: 0,
            ..SimulationConfig::default()
        };
        assert!(empirical_power(0.5, 10, 0.05, &no_runs).is_err());
    }

    #[test]
    fn summary_counts_are_consistent() {
        let config = SimulationConfig {
            num_runs: 200,
            seed: Some(7),
            ..SimulationConfig::default()
        };
        let summary = empirical_power(0.8, 20, 0.05, &config).unwrap();
        assert_eq!(summary.runs, 200);
        assert!(summary.rejected <= summary.runs - summary.skipped);
        let expected = summary.rejected as f64 / (summary.runs - summary.skipped) as f64;
        assert_eq!(summary.empirical_power, expected);
    }
}
