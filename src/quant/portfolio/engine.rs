//! # Portfolio Engine
//!
//! $$
//! P \xrightarrow{\ r\ } (\mu, \Sigma) \xrightarrow{\ \text{opt}\ } \mathbf{w}^\* \xrightarrow{\ \text{VaR}\ } \text{report}
//! $$
//!
//! High-level orchestration: one price matrix in, one [`RiskReport`] out.

use tracing::info;

use super::data::compute_returns;
use super::data::correlation_matrix;
use super::optimizers::optimize;
use super::types::ObjectiveSpec;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::market::PriceMatrix;
use crate::quant::report::RiskReport;
use crate::quant::report::assemble;
use crate::quant::risk::compute_metrics;
use crate::solver::ClarabelSolver;
use crate::stats::StatrsStatistics;
use crate::traits::SolverExt;
use crate::traits::StatisticsExt;

/// One analysis run over an already-fetched price matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnalysisRequest {
  pub objective: ObjectiveSpec,
  pub confidence_level: f64,
  pub investment_term_days: u32,
}

/// Stateless pipeline over pluggable numerical backends. Shareable across
/// threads when both backends are.
#[derive(Clone, Debug)]
pub struct PortfolioEngine<S = ClarabelSolver, T = StatrsStatistics> {
  solver: S,
  stats: T,
}

impl PortfolioEngine {
  /// Engine on the default Clarabel and statrs backends.
  pub fn new(config: &EngineConfig) -> Self {
    Self::with_backends(ClarabelSolver::new(config.solver.clone()), StatrsStatistics)
  }
}

impl<S: SolverExt, T: StatisticsExt> PortfolioEngine<S, T> {
  pub fn with_backends(solver: S, stats: T) -> Self {
    Self { solver, stats }
  }

  /// Returns → allocation → risk metrics → report. Columns of `prices` are
  /// the basket, in weight order.
  pub fn analyze(&self, prices: &PriceMatrix, request: &AnalysisRequest) -> Result<RiskReport> {
    let data = compute_returns(prices)?;
    let allocation = optimize(
      &self.solver,
      &data.expected_returns,
      &data.covariance,
      &request.objective,
    )?;
    let metrics = compute_metrics(
      &self.stats,
      &data.returns,
      &data.expected_returns,
      &data.covariance,
      allocation.weights(),
      request.confidence_level,
      request.investment_term_days,
    )?;
    let corr = correlation_matrix(&data.returns)?;

    info!(
      objective = %request.objective.kind(),
      observations = data.n_observations(),
      daily_var = metrics.daily_var,
      "portfolio analysis complete"
    );

    Ok(assemble(
      request.objective.kind(),
      request.investment_term_days,
      prices,
      allocation.weights(),
      &metrics,
      &corr,
    ))
  }
}
