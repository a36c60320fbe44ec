//! Power-curve tables over a grid of effect sizes and sample sizes.

use crate::error::PowerError;
use crate::solver::{solve, PowerQuery};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One cell of a power curve: the power of a two-sample t-test at a fixed
/// effect size and per-group sample size.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CurvePoint {
    /// Cohen's d for this cell.
    pub effect_size: f64,
    /// Observations per group for this cell.
    pub sample_size_per_group: usize,
    /// Analytic power at this cell.
    pub power: f64,
}

/// Evaluate power over the Cartesian grid of `effect_sizes` x `sample_sizes`
/// at a fixed significance level.
///
/// The output is ordered effect-size-major (outer loop over effect sizes,
/// inner over sample sizes, both in input order), which keeps points for one
/// effect size contiguous for plotting. Every cell is a purely evaluative
/// solve; no root-finding runs here.
///
/// # Errors
///
/// Propagates [`PowerError::InvalidQuery`] from the first offending cell,
/// e.g. a zero effect size or a group size below 2.
pub fn power_curve(
    effect_sizes: &[f64],
    sample_sizes: &[usize],
    significance_level: f64,
) -> Result<Vec<CurvePoint>, PowerError> {
    let mut points = Vec::with_capacity(effect_sizes.len() * sample_sizes.len());
    for &effect_size in effect_sizes {
        for &n in sample_sizes {
            let query = PowerQuery::for_power(effect_size, n)
                .with_significance_level(significance_level);
            let solved = solve(&query)?;
            points.push(CurvePoint {
                effect_size,
                sample_size_per_group: n,
                power: solved.power,
            });
        }
    }
    Ok(points)
}
