//! Analytic power solver for the two-sample t-test.
//!
//! Given any three of {effect size, per-group sample size, significance
//! level, power}, [`solve`] fills in the missing one. Power for a known
//! (effect, n) pair is a direct noncentral-t evaluation; the other two
//! directions use monotone bisection, since power is strictly increasing in
//! both |effect| and n.

use log::{debug, warn};

use crate::error::PowerError;
use crate::noncentral::two_sided_power;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default two-sided significance level.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Convergence tolerance on power for the bisection directions.
const POWER_TOL: f64 = 1e-6;

/// Hard iteration cap for bisection; guarantees termination.
const MAX_ITER: usize = 200;

/// Upper bound for the sample-size bracket expansion.
const MAX_SAMPLE_SIZE: f64 = 1e7;

/// Upper bound for the effect-size bracket expansion.
const MAX_EFFECT_SIZE: f64 = 100.0;

/// A power-analysis request. Exactly one of `effect_size`,
/// `sample_size_per_group` and `power` must be `None`; that is the quantity
/// the solver computes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PowerQuery {
    /// Cohen's d, the standardized mean difference. Any nonzero finite value;
    /// the sign is irrelevant to power and normalized to a magnitude
    /// internally.
    pub effect_size: Option<f64>,
    /// Observations per group; at least 2 when set.
    pub sample_size_per_group: Option<usize>,
    /// Two-sided type I error rate, strictly inside (0, 1).
    pub significance_level: f64,
    /// Target or computed power, strictly inside (0, 1) when set.
    pub power: Option<f64>,
}

impl Default for PowerQuery {
    fn default() -> Self {
        Self {
            effect_size: None,
            sample_size_per_group: None,
            significance_level: DEFAULT_ALPHA,
            power: None,
        }
    }
}

impl PowerQuery {
    /// Query that solves for power from a known effect size and sample size.
    pub fn for_power(effect_size: f64, sample_size_per_group: usize) -> Self {
        Self {
            effect_size: Some(effect_size),
            sample_size_per_group: Some(sample_size_per_group),
            ..Self::default()
        }
    }

    /// Query that solves for the per-group sample size reaching `power`.
    pub fn for_sample_size(effect_size: f64, power: f64) -> Self {
        Self {
            effect_size: Some(effect_size),
            power: Some(power),
            ..Self::default()
        }
    }

    /// Query that solves for the smallest detectable |effect size|.
    pub fn for_effect_size(sample_size_per_group: usize, power: f64) -> Self {
        Self {
            sample_size_per_group: Some(sample_size_per_group),
            power: Some(power),
            ..Self::default()
        }
    }

    /// Same query at a non-default significance level.
    pub fn with_significance_level(mut self, alpha: f64) -> Self {
        self.significance_level = alpha;
        self
    }
}

/// A fully populated solution to a [`PowerQuery`].
///
/// When the solver ran a bisection, `converged` reports whether it reached
/// its tolerance within the iteration and bracket bounds; on `false` the
/// fields hold the best available estimate rather than an error.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PowerResult {
    /// Effect size; a positive magnitude when it was the solved quantity.
    pub effect_size: f64,
    /// Observations per group; when solved, the smallest integer whose power
    /// meets the request.
    pub sample_size_per_group: usize,
    /// Two-sided significance level of the query.
    pub significance_level: f64,
    /// Achieved power at the reported effect size and sample size.
    pub power: f64,
    /// Whether root-finding met its tolerance (always true for the purely
    /// evaluative power direction).
    pub converged: bool,
}

/// Which slot of the query is to be solved for.
enum Unknown {
    Power,
    SampleSize,
    EffectSize,
}

/// Solve a [`PowerQuery`] for its missing quantity.
///
/// # Errors
///
/// [`PowerError::InvalidQuery`] when zero or more than one solvable field is
/// unset, when `effect_size` is zero or non-finite, or when any set field
/// lies outside its domain. Non-convergence is reported through
/// [`PowerResult::converged`], never as an error.
pub fn solve(query: &PowerQuery) -> Result<PowerResult, PowerError> {
    let unknown = validate(query)?;
    let alpha = query.significance_level;

    match unknown {
        Unknown::Power => {
            // Purely evaluative; no root-finding involved.
            let effect = query.effect_size.ok_or_else(missing_field)?;
            let n = query.sample_size_per_group.ok_or_else(missing_field)?;
            let power = two_sided_power(effect.abs(), n as f64, alpha);
            Ok(PowerResult {
                effect_size: effect,
                sample_size_per_group: n,
                significance_level: alpha,
                power,
                converged: true,
            })
        }
        Unknown::SampleSize => {
            let effect = query.effect_size.ok_or_else(missing_field)?;
            let target = query.power.ok_or_else(missing_field)?;
            solve_sample_size(effect, target, alpha)
        }
        Unknown::EffectSize => {
            let n = query.sample_size_per_group.ok_or_else(missing_field)?;
            let target = query.power.ok_or_else(missing_field)?;
            solve_effect_size(n, target, alpha)
        }
    }
}

fn missing_field() -> PowerError {
    PowerError::InvalidQuery("query field vanished between validation and solving".into())
}

fn validate(query: &PowerQuery) -> Result<Unknown, PowerError> {
    let unknown = match (
        query.effect_size.is_some(),
        query.sample_size_per_group.is_some(),
        query.power.is_some(),
    ) {
        (true, true, false) => Unknown::Power,
        (true, false, true) => Unknown::SampleSize,
        (false, true, true) => Unknown::EffectSize,
        _ => {
            return Err(PowerError::InvalidQuery(
                "exactly one of effect_size, sample_size_per_group and power must be unset"
                    .to_string(),
            ))
        }
    };

    let alpha = query.significance_level;
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(PowerError::InvalidQuery(format!(
            "significance_level must lie strictly in (0, 1), got {alpha}"
        )));
    }
    if let Some(d) = query.effect_size {
        if !d.is_finite() || d == 0.0 {
            return Err(PowerError::InvalidQuery(format!(
                "effect_size must be nonzero and finite, got {d}"
            )));
        }
    }
    if let Some(n) = query.sample_size_per_group {
        if n < 2 {
            return Err(PowerError::InvalidQuery(format!(
                "sample_size_per_group must be at least 2, got {n}"
            )));
        }
    }
    if let Some(p) = query.power {
        if !(p > 0.0 && p < 1.0) {
            return Err(PowerError::InvalidQuery(format!(
                "power must lie strictly in (0, 1), got {p}"
            )));
        }
        if p <= alpha {
            return Err(PowerError::InvalidQuery(format!(
                "target power {p} must exceed the significance level {alpha}; \
                 a two-sided test rejects a true null at rate alpha already"
            )));
        }
    }
    Ok(unknown)
}

/// Smallest integer per-group n whose power reaches `target` at |`effect`|.
fn solve_sample_size(effect: f64, target: f64, alpha: f64) -> Result<PowerResult, PowerError> {
    let effect = effect.abs();
    let power_at = |n: f64| two_sided_power(effect, n, alpha);

    let mut lo = 2.0;
    if power_at(lo) >= target {
        return Ok(result_at_n(effect, 2, alpha, true));
    }

    // Bracket: double until the upper end clears the target. The doubled
    // endpoint is clipped to the cap first, so no power evaluation ever runs
    // beyond MAX_SAMPLE_SIZE.
    let mut hi = 4.0;
    while power_at(hi) < target {
        if hi >= MAX_SAMPLE_SIZE {
            warn!(
                "sample-size search hit the {MAX_SAMPLE_SIZE} cap at effect {effect}, \
                 target power {target}; returning the cap unconverged"
            );
            return Ok(result_at_n(effect, MAX_SAMPLE_SIZE as usize, alpha, false));
        }
        hi = (hi * 2.0).min(MAX_SAMPLE_SIZE);
    }

    // Bisect the continuous relaxation down to an interval of width < 1;
    // the integer refinement below absorbs anything finer.
    let mut converged = false;
    for _ in 0..MAX_ITER {
        if hi - lo < 0.5 {
            converged = true;
            break;
        }
        let mid = (lo + hi) / 2.0;
        if power_at(mid) < target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    if !converged {
        warn!("sample-size bisection exhausted {MAX_ITER} iterations at effect {effect}");
    }

    // Take the ceiling of the root, then pin down the exact smallest integer
    // meeting the target so the guarantee holds regardless of tolerance.
    let mut n = hi.ceil() as usize;
    while n > 2 && power_at((n - 1) as f64) >= target {
        n -= 1;
    }
    while power_at(n as f64) < target {
        n += 1;
    }
    debug!("solved sample size {n} for effect {effect}, target power {target}");
    Ok(result_at_n(effect, n, alpha, converged))
}

fn result_at_n(effect: f64, n: usize, alpha: f64, converged: bool) -> PowerResult {
    PowerResult {
        effect_size: effect,
        sample_size_per_group: n,
        significance_level: alpha,
        power: two_sided_power(effect, n as f64, alpha),
        converged,
    }
}

/// Magnitude of the effect size reaching `target` power at per-group `n`.
/// The sign of the underlying difference is not recoverable from power.
fn solve_effect_size(n: usize, target: f64, alpha: f64) -> Result<PowerResult, PowerError> {
    let n_f = n as f64;
    let power_at = |d: f64| two_sided_power(d, n_f, alpha);

    let mut lo = 0.0;
    let mut hi = 1.0;
    while power_at(hi) < target {
        hi *= 2.0;
        if hi > MAX_EFFECT_SIZE {
            warn!(
                "effect-size search hit the {MAX_EFFECT_SIZE} cap at n {n}, \
                 target power {target}; returning the cap unconverged"
            );
            return Ok(PowerResult {
                effect_size: hi,
                sample_size_per_group: n,
                significance_level: alpha,
                power: power_at(hi),
                converged: false,
            });
        }
    }

    let mut converged = false;
    let mut mid = (lo + hi) / 2.0;
    for _ in 0..MAX_ITER {
        mid = (lo + hi) / 2.0;
        let p = power_at(mid);
        if (p - target).abs() < POWER_TOL {
            converged = true;
            break;
        }
        if p < target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    if !converged {
        warn!("effect-size bisection exhausted {MAX_ITER} iterations at n {n}");
    }
    debug!("solved effect size {mid} for n {n}, target power {target}");
    Ok(PowerResult {
        effect_size: mid,
        sample_size_per_group: n,
        significance_level: alpha,
        power: power_at(mid),
        converged,
    })
}
