//! # Portfolio Optimizers
//!
//! $$
//! \max_{\mathbf{w}\in\Delta}\ \mu^\top\mathbf{w}\ \ \text{or}\ \ \min_{\mathbf{w}\in\Delta}\ \mathbf{w}^\top\Sigma\mathbf{w},
//! \qquad \mathbf{w}^\top\Sigma\mathbf{w} \le \bar\sigma^2 \iff \|F^\top\mathbf{w}\|_2 \le \bar\sigma,\ \Sigma = FF^\top
//! $$
//!
//! Long-only mean-variance optimization as a convex program.

use nalgebra::DMatrix;
use nalgebra::SymmetricEigen;
use ndarray::Array1;
use ndarray::Array2;
use tracing::info;
use tracing::warn;

use super::types::Allocation;
use super::types::ObjectiveSpec;
use crate::error::Result;
use crate::error::RiskError;
use crate::solver::Constraint;
use crate::solver::QuadraticProgram;
use crate::traits::SolverExt;

/// Relative cutoff below which covariance eigenvalues are treated as zero.
const EIGEN_TOLERANCE: f64 = 1e-12;

/// `wᵀΣw`
pub fn portfolio_variance(cov: &Array2<f64>, w: &[f64]) -> f64 {
  let n = w.len();
  let mut acc = 0.0;
  for i in 0..n {
    for j in 0..n {
      acc += w[i] * cov[[i, j]] * w[j];
    }
  }
  acc
}

/// `E·w`
pub fn portfolio_return(mu: &Array1<f64>, w: &[f64]) -> f64 {
  mu.iter().zip(w.iter()).map(|(m, x)| m * x).sum()
}

fn symmetrized(cov: &Array2<f64>) -> DMatrix<f64> {
  let n = cov.nrows();
  DMatrix::from_fn(n, n, |i, j| 0.5 * (cov[[i, j]] + cov[[j, i]]))
}

/// Rows of `Fᵀ` with `Σ = F Fᵀ`, so that `‖Fᵀw‖² = wᵀΣw`. Negative
/// eigenvalues (round-off on a PSD matrix) are dropped.
fn risk_factor(cov: &Array2<f64>) -> DMatrix<f64> {
  let n = cov.nrows();
  let eig = SymmetricEigen::new(symmetrized(cov));
  let scale = eig.eigenvalues.iter().cloned().fold(0.0_f64, f64::max);
  let keep: Vec<usize> = (0..n)
    .filter(|&k| eig.eigenvalues[k] > EIGEN_TOLERANCE * scale.max(f64::MIN_POSITIVE))
    .collect();

  DMatrix::from_fn(keep.len(), n, |r, i| {
    let k = keep[r];
    eig.eigenvalues[k].sqrt() * eig.eigenvectors[(i, k)]
  })
}

fn validate_inputs(mu: &Array1<f64>, cov: &Array2<f64>) -> Result<usize> {
  let n = mu.len();
  if n == 0 {
    return Err(RiskError::InsufficientData("asset basket is empty".into()));
  }
  if cov.nrows() != n || cov.ncols() != n {
    return Err(RiskError::InvalidPriceData(format!(
      "covariance is {}x{}, expected {n}x{n}",
      cov.nrows(),
      cov.ncols()
    )));
  }
  if mu.iter().chain(cov.iter()).any(|v| !v.is_finite()) {
    return Err(RiskError::InvalidPriceData(
      "expected returns or covariance contain non-finite values".into(),
    ));
  }
  Ok(n)
}

/// Translate an objective into a convex program over the simplex.
pub fn build_program(
  mu: &Array1<f64>,
  cov: &Array2<f64>,
  objective: &ObjectiveSpec,
) -> Result<QuadraticProgram> {
  let n = validate_inputs(mu, cov)?;

  let q = if objective.minimizes_risk() {
    vec![0.0; n]
  } else {
    mu.iter().map(|m| -m).collect()
  };
  let mut program = QuadraticProgram::new(q)
    .subject_to(Constraint::Equal {
      a: vec![1.0; n],
      b: 1.0,
    })
    .subject_to(Constraint::NonNegative);

  if objective.minimizes_risk() {
    // ½ wᵀ(2Σ)w = wᵀΣw
    program = program.with_quadratic(symmetrized(cov) * 2.0);
  }

  if let Some(ceiling) = objective.risk_ceiling() {
    if !ceiling.is_finite() {
      return Err(RiskError::InvalidParameter {
        name: "risk_limit",
        reason: format!("{ceiling} is not a finite number"),
      });
    }
    if ceiling < 0.0 {
      return Err(RiskError::InfeasibleOrUnbounded(format!(
        "infeasible (risk limit {ceiling} is below zero)"
      )));
    }
    let factor = risk_factor(cov);
    if factor.nrows() > 0 {
      program = program.subject_to(Constraint::NormBound {
        factor,
        bound: ceiling.sqrt(),
      });
    }
  }

  if let ObjectiveSpec::MinRiskWithReturn { target_return } = objective {
    if !target_return.is_finite() {
      return Err(RiskError::InvalidParameter {
        name: "target_return",
        reason: format!("{target_return} is not a finite number"),
      });
    }
    // E·w >= target  ⇔  -E·w <= -target
    program = program.subject_to(Constraint::LessEqual {
      a: mu.iter().map(|m| -m).collect(),
      b: -target_return,
    });
  }

  Ok(program)
}

/// Optimal long-only, fully invested allocation for `objective`.
pub fn optimize(
  solver: &dyn SolverExt,
  mu: &Array1<f64>,
  cov: &Array2<f64>,
  objective: &ObjectiveSpec,
) -> Result<Allocation> {
  let program = build_program(mu, cov, objective)?;
  let n = program.num_vars();
  let solution = solver.solve(&program)?;

  info!(
    objective = %objective.kind(),
    backend = solver.name(),
    status = %solution.status,
    iterations = solution.iterations,
    "portfolio optimization finished"
  );

  if !solution.status.is_optimal() {
    warn!(objective = %objective.kind(), status = %solution.status, "no optimal allocation");
    return Err(RiskError::InfeasibleOrUnbounded(solution.status.to_string()));
  }
  if solution.x.len() != n {
    return Err(RiskError::Solver(format!(
      "backend returned {} weights for {n} assets",
      solution.x.len()
    )));
  }

  // Interior-point iterates sit a hair off the boundary.
  let clipped: Vec<f64> = solution.x.iter().map(|w| w.max(0.0)).collect();
  let total: f64 = clipped.iter().sum();
  if !(total.is_finite() && total > 0.0) {
    return Err(RiskError::InfeasibleOrUnbounded("numerical_error".into()));
  }

  Ok(Allocation {
    weights: clipped.iter().map(|w| w / total).collect(),
  })
}
