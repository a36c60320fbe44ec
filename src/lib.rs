//! Power analysis for two-sample comparisons of means.
//!
//! Three pieces, sharing the same statistical assumptions but otherwise
//! independent:
//!
//! - [`solve`] fills in the missing one of {effect size, per-group sample
//!   size, significance level, power} using the noncentral-t power
//!   relationship for a two-sample t-test.
//! - [`power_curve`] tabulates power over a grid of effect sizes and sample
//!   sizes for reporting.
//! - [`empirical_power`] estimates power by simulating repeated two-group
//!   experiments, as an independent cross-check of the analytic numbers.
//!
//! ```
//! use trialpower::{solve, PowerQuery};
//!
//! // Per-group n for a medium effect at 80% power (the textbook 64).
//! let res = solve(&PowerQuery::for_sample_size(0.5, 0.8)).unwrap();
//! assert_eq!(res.sample_size_per_group, 64);
//! ```

mod curve;
mod error;
mod noncentral;
mod simulation;
mod solver;

pub use curve::{power_curve, CurvePoint};
pub use error::PowerError;
pub use noncentral::{noncentral_t_cdf, noncentral_t_sf, t_critical_two_sided};
pub use simulation::{empirical_power, SimulationConfig, SimulationSummary};
pub use solver::{solve, PowerQuery, PowerResult, DEFAULT_ALPHA};

use statrs::distribution::{ContinuousCDF, StudentsT};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Arithmetic mean; NaN for an empty slice.
pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return f64::NAN;
    }
    xs.iter().sum::<f64>() / (xs.len() as f64)
}

/// Unbiased sample variance (n-1 denominator); NaN below two observations.
pub fn variance_sample(xs: &[f64]) -> f64 {
    let n = xs.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(xs);
    xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / ((n as f64) - 1.0)
}

/// Unbiased sample standard deviation (n-1 denominator).
pub fn stddev_sample(xs: &[f64]) -> f64 {
    variance_sample(xs).sqrt()
}

/// Cohen's d from group means and a pooled standard deviation.
pub fn cohen_d(mean_a: f64, mean_b: f64, pooled_sd: f64) -> f64 {
    if pooled_sd <= 0.0 {
        0.0
    } else {
        (mean_a - mean_b) / pooled_sd
    }
}

/// Pooled standard deviation of two groups; NaN when either group has fewer
/// than two observations.
pub fn pooled_stddev(sd_a: f64, n_a: usize, sd_b: f64, n_b: usize) -> f64 {
    if n_a < 2 || n_b < 2 {
        return f64::NAN;
    }
    let (na, nb) = (n_a as f64, n_b as f64);
    let pooled_var = ((na - 1.0) * sd_a * sd_a + (nb - 1.0) * sd_b * sd_b) / (na + nb - 2.0);
    pooled_var.sqrt()
}

/// Outcome of a two-sample t-test.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TwoSampleTTest {
    /// The t statistic, signed as mean(a) - mean(b).
    pub t_stat: f64,
    /// Degrees of freedom: Welch-Satterthwaite for the unequal-variance
    /// form, `n_a + n_b - 2` for the pooled form.
    pub df: f64,
    /// Two-sided p-value.
    pub p_value: f64,
}

/// Two-sided two-sample t-test for a difference in means.
///
/// `equal_variance = false` gives the Welch form (the default everywhere in
/// this crate's simulations), `true` the classic pooled form.
///
/// # Errors
///
/// [`PowerError::InvalidQuery`] when either group has fewer than two
/// observations; [`PowerError::DegenerateSample`] when the standard error is
/// zero and the statistic is undefined.
pub fn two_sample_t_test(
    a: &[f64],
    b: &[f64],
    equal_variance: bool,
) -> Result<TwoSampleTTest, PowerError> {
    if a.len() < 2 || b.len() < 2 {
        return Err(PowerError::InvalidQuery(format!(
            "each group needs at least 2 observations, got {} and {}",
            a.len(),
            b.len()
        )));
    }
    let (na, nb) = (a.len() as f64, b.len() as f64);
    let (ma, mb) = (mean(a), mean(b));
    let (va, vb) = (variance_sample(a), variance_sample(b));

    let (se2, df) = if equal_variance {
        let pooled_var = ((na - 1.0) * va + (nb - 1.0) * vb) / (na + nb - 2.0);
        (pooled_var * (1.0 / na + 1.0 / nb), na + nb - 2.0)
    } else {
        let se2 = va / na + vb / nb;
        // Welch-Satterthwaite approximation.
        let num = se2 * se2;
        let den = (va / na).powi(2) / (na - 1.0) + (vb / nb).powi(2) / (nb - 1.0);
        (se2, if den == 0.0 { f64::INFINITY } else { num / den })
    };

    if se2 == 0.0 {
        return Err(PowerError::DegenerateSample);
    }

    let t_stat = (ma - mb) / se2.sqrt();
    let tdist = StudentsT::new(0.0, 1.0, df).unwrap();
    let p_value = 2.0 * (1.0 - tdist.cdf(t_stat.abs()));
    Ok(TwoSampleTTest {
        t_stat,
        df,
        p_value,
    })
}
