//! Error taxonomy for power queries and simulations.

use thiserror::Error;

/// Errors surfaced by the solver, the curve generator and the simulator.
///
/// Numerical non-convergence is deliberately *not* an error: the solver
/// reports it through [`PowerResult::converged`](crate::PowerResult) so that
/// batch callers can keep going and inspect per-point status.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PowerError {
    /// The request was malformed or a field was outside its valid domain.
    /// Caller error; never retried.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Both simulated groups had zero variance, so the t statistic is
    /// undefined for that draw.
    #[error("degenerate sample: zero variance in both groups, t statistic undefined")]
    DegenerateSample,
}
