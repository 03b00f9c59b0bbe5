//! # Traits
//!
//! $$
//! \text{Backend contracts: }\mathcal{S}:\text{QP}\to w^\*,\quad \mathcal{T}:(p, x)\to(\Phi^{-1}(p), q_p(x))
//! $$
//!
//! Seams between the engine and the numerical libraries it relies on.

use crate::error::Result;
use crate::solver::QpSolution;
use crate::solver::QuadraticProgram;

/// Convex quadratic-program backend.
pub trait SolverExt: Send + Sync {
  /// Solve the program. A returned solution may still carry a non-optimal
  /// status; only setup failures are reported as `Err`.
  fn solve(&self, problem: &QuadraticProgram) -> Result<QpSolution>;

  /// Short backend name for logs.
  fn name(&self) -> &'static str {
    "qp"
  }
}

/// Statistics backend used by the risk metrics.
pub trait StatisticsExt: Send + Sync {
  /// Quantile function of the standard normal distribution.
  fn inverse_normal_cdf(&self, p: f64) -> f64;

  /// The `q`-th percentile (0..=100) of `sample`.
  fn percentile(&self, sample: &[f64], q: f64) -> f64;
}
