//! Clarabel backend for [`QuadraticProgram`].

use clarabel::algebra::CscMatrix;
use clarabel::solver::DefaultSettingsBuilder;
use clarabel::solver::DefaultSolver;
use clarabel::solver::IPSolver;
use clarabel::solver::SolverStatus;
use clarabel::solver::SupportedConeT;
use nalgebra::DMatrix;
use tracing::debug;

use super::Constraint;
use super::QpSolution;
use super::QuadraticProgram;
use super::SolveStatus;
use crate::config::SolverSettings;
use crate::error::Result;
use crate::error::RiskError;
use crate::traits::SolverExt;

impl From<SolverStatus> for SolveStatus {
  fn from(status: SolverStatus) -> Self {
    match status {
      SolverStatus::Solved => SolveStatus::Optimal,
      SolverStatus::AlmostSolved => SolveStatus::AlmostOptimal,
      SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
        SolveStatus::Infeasible
      }
      SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => SolveStatus::Unbounded,
      SolverStatus::MaxIterations | SolverStatus::MaxTime => SolveStatus::MaxIterations,
      SolverStatus::NumericalError | SolverStatus::InsufficientProgress => {
        SolveStatus::NumericalError
      }
      _ => SolveStatus::Unknown,
    }
  }
}

/// Interior-point QP/SOCP solver backed by Clarabel.
#[derive(Clone, Debug, Default)]
pub struct ClarabelSolver {
  settings: SolverSettings,
}

impl ClarabelSolver {
  pub fn new(settings: SolverSettings) -> Self {
    Self { settings }
  }
}

impl SolverExt for ClarabelSolver {
  fn solve(&self, problem: &QuadraticProgram) -> Result<QpSolution> {
    let n = problem.num_vars();
    let p = upper_triangle_csc(problem.p.as_ref(), n)?;
    let (a, b, cones) = stack_constraints(&problem.constraints, n)?;

    let settings = DefaultSettingsBuilder::default()
      .verbose(self.settings.verbose)
      .max_iter(self.settings.max_iter)
      .tol_gap_abs(self.settings.tol_gap_abs)
      .tol_gap_rel(self.settings.tol_gap_rel)
      .build()
      .map_err(|e| RiskError::Solver(e.to_string()))?;

    let mut solver = DefaultSolver::new(&p, &problem.q, &a, &b, &cones, settings);
    solver.solve();

    let status: SolveStatus = solver.solution.status.into();
    debug!(
      %status,
      iterations = solver.info.iterations,
      rows = b.len(),
      cols = n,
      "clarabel finished"
    );

    Ok(QpSolution {
      status,
      x: solver.solution.x.clone(),
      objective: solver.solution.obj_val,
      iterations: solver.info.iterations,
    })
  }

  fn name(&self) -> &'static str {
    "clarabel"
  }
}

/// Stack constraint blocks into `A x + s = b` form with matching cones.
fn stack_constraints(
  constraints: &[Constraint],
  n: usize,
) -> Result<(CscMatrix<f64>, Vec<f64>, Vec<SupportedConeT<f64>>)> {
  let mut rows: Vec<Vec<f64>> = Vec::new();
  let mut b = Vec::new();
  let mut cones = Vec::new();

  for constraint in constraints {
    match constraint {
      Constraint::Equal { a, b: rhs } => {
        check_len(a.len(), n)?;
        rows.push(a.clone());
        b.push(*rhs);
        cones.push(SupportedConeT::ZeroConeT(1));
      }
      Constraint::LessEqual { a, b: rhs } => {
        check_len(a.len(), n)?;
        rows.push(a.clone());
        b.push(*rhs);
        cones.push(SupportedConeT::NonnegativeConeT(1));
      }
      Constraint::NonNegative => {
        for i in 0..n {
          let mut row = vec![0.0; n];
          row[i] = -1.0;
          rows.push(row);
          b.push(0.0);
        }
        cones.push(SupportedConeT::NonnegativeConeT(n));
      }
      Constraint::NormBound { factor, bound } => {
        check_len(factor.ncols(), n)?;
        // s = (bound, F x)
        rows.push(vec![0.0; n]);
        b.push(*bound);
        for k in 0..factor.nrows() {
          rows.push(factor.row(k).iter().map(|v| -v).collect());
          b.push(0.0);
        }
        cones.push(SupportedConeT::SecondOrderConeT(factor.nrows() + 1));
      }
    }
  }

  Ok((dense_rows_to_csc(&rows, n), b, cones))
}

fn check_len(got: usize, n: usize) -> Result<()> {
  if got != n {
    return Err(RiskError::Solver(format!(
      "constraint has {got} coefficients, problem has {n} variables"
    )));
  }
  Ok(())
}

fn dense_rows_to_csc(rows: &[Vec<f64>], n: usize) -> CscMatrix<f64> {
  let mut colptr = Vec::with_capacity(n + 1);
  let mut rowval = Vec::new();
  let mut nzval = Vec::new();

  colptr.push(0);
  for j in 0..n {
    for (i, row) in rows.iter().enumerate() {
      let v = row[j];
      if v != 0.0 {
        rowval.push(i);
        nzval.push(v);
      }
    }
    colptr.push(rowval.len());
  }

  CscMatrix::new(rows.len(), n, colptr, rowval, nzval)
}

/// Clarabel expects only the upper triangle of `P`.
fn upper_triangle_csc(p: Option<&DMatrix<f64>>, n: usize) -> Result<CscMatrix<f64>> {
  let mut colptr = Vec::with_capacity(n + 1);
  let mut rowval = Vec::new();
  let mut nzval = Vec::new();
  colptr.push(0);

  match p {
    None => colptr.extend(std::iter::repeat(0).take(n)),
    Some(p) => {
      if p.nrows() != n || p.ncols() != n {
        return Err(RiskError::Solver(format!(
          "quadratic term is {}x{}, expected {n}x{n}",
          p.nrows(),
          p.ncols()
        )));
      }
      for j in 0..n {
        for i in 0..=j {
          let v = p[(i, j)];
          if v != 0.0 {
            rowval.push(i);
            nzval.push(v);
          }
        }
        colptr.push(rowval.len());
      }
    }
  }

  Ok(CscMatrix::new(n, n, colptr, rowval, nzval))
}
