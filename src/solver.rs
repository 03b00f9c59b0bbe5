//! # Solver
//!
//! $$
//! \min_x \tfrac12 x^\top P x + q^\top x \quad \text{s.t.}\quad Ax + s = b,\ s \in \mathcal{K}
//! $$
//!
//! Backend-neutral description of a convex quadratic program with linear,
//! non-negativity and second-order-cone constraints.

pub mod clarabel;

use nalgebra::DMatrix;

pub use self::clarabel::ClarabelSolver;

/// One constraint block of a [`QuadraticProgram`].
#[derive(Clone, Debug)]
pub enum Constraint {
  /// `a · x = b`
  Equal { a: Vec<f64>, b: f64 },
  /// `a · x <= b`
  LessEqual { a: Vec<f64>, b: f64 },
  /// `x >= 0` element-wise.
  NonNegative,
  /// `‖F x‖₂ <= bound`
  NormBound { factor: DMatrix<f64>, bound: f64 },
}

/// Convex quadratic program over `n` variables.
#[derive(Clone, Debug)]
pub struct QuadraticProgram {
  /// Symmetric PSD matrix of the quadratic term, `None` for an LP.
  pub p: Option<DMatrix<f64>>,
  /// Linear objective coefficients.
  pub q: Vec<f64>,
  pub constraints: Vec<Constraint>,
}

impl QuadraticProgram {
  pub fn new(q: Vec<f64>) -> Self {
    Self {
      p: None,
      q,
      constraints: Vec::new(),
    }
  }

  pub fn with_quadratic(mut self, p: DMatrix<f64>) -> Self {
    self.p = Some(p);
    self
  }

  pub fn subject_to(mut self, constraint: Constraint) -> Self {
    self.constraints.push(constraint);
    self
  }

  pub fn num_vars(&self) -> usize {
    self.q.len()
  }
}

/// Solution status reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
  Optimal,
  /// Solved to reduced accuracy.
  AlmostOptimal,
  Infeasible,
  Unbounded,
  MaxIterations,
  NumericalError,
  Unknown,
}

impl SolveStatus {
  pub fn is_optimal(self) -> bool {
    matches!(self, SolveStatus::Optimal | SolveStatus::AlmostOptimal)
  }
}

impl std::fmt::Display for SolveStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      SolveStatus::Optimal => write!(f, "optimal"),
      SolveStatus::AlmostOptimal => write!(f, "optimal_inaccurate"),
      SolveStatus::Infeasible => write!(f, "infeasible"),
      SolveStatus::Unbounded => write!(f, "unbounded"),
      SolveStatus::MaxIterations => write!(f, "max_iterations"),
      SolveStatus::NumericalError => write!(f, "numerical_error"),
      SolveStatus::Unknown => write!(f, "unknown"),
    }
  }
}

/// Primal solution returned by a backend.
#[derive(Debug, Clone)]
pub struct QpSolution {
  pub status: SolveStatus,
  pub x: Vec<f64>,
  /// Objective value `½xᵀPx + qᵀx`.
  pub objective: f64,
  pub iterations: u32,
}
