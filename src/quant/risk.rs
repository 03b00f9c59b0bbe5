//! # Risk Metrics
//!
//! $$
//! \mathrm{VaR}^{par}_c = z_c\,\sigma_p - \mu_p,\qquad
//! \mathrm{VaR}^{hist}_c = -Q_{1-c}(R\mathbf{w}),\qquad
//! \mathrm{VaR}_c = \max(\mathrm{VaR}^{par}_c, \mathrm{VaR}^{hist}_c)
//! $$
//!
//! Daily and annualized portfolio moments and Value-at-Risk at daily, weekly
//! and yearly horizons. All values are fractions; conversion to percentages
//! happens in [`crate::quant::report`].

use ndarray::Array1;
use ndarray::Array2;
use tracing::debug;

use super::TRADING_DAYS_PER_WEEK;
use super::TRADING_DAYS_PER_YEAR;
use super::portfolio::optimizers::portfolio_return;
use super::portfolio::optimizers::portfolio_variance;
use crate::error::Result;
use crate::error::RiskError;
use crate::traits::StatisticsExt;

/// Portfolio moments and VaR for one allocation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RiskMetrics {
  pub daily_return: f64,
  pub daily_risk: f64,
  pub annual_return: f64,
  pub annual_risk: f64,
  pub confidence_level: f64,
  /// Normal-approximation daily VaR.
  pub parametric_var: f64,
  /// Empirical daily VaR from the realized portfolio returns.
  pub historical_var: f64,
  pub daily_var: f64,
  pub weekly_var: f64,
  pub yearly_var: f64,
}

/// Realized daily returns of the weighted portfolio, `R·w`.
pub fn portfolio_returns(returns: &Array2<f64>, weights: &[f64]) -> Result<Array1<f64>> {
  if returns.ncols() != weights.len() {
    return Err(RiskError::InvalidPriceData(format!(
      "returns have {} columns, allocation has {} weights",
      returns.ncols(),
      weights.len()
    )));
  }
  Ok(returns.dot(&Array1::from(weights.to_vec())))
}

/// Combined daily VaR: the larger of the two loss estimates.
pub fn blend_var(parametric: f64, historical: f64) -> f64 {
  parametric.max(historical)
}

/// `√min(252, term)`, the yearly VaR scale for a holding period of `term_days`.
pub fn yearly_scale(term_days: u32) -> f64 {
  (term_days as f64).min(TRADING_DAYS_PER_YEAR).sqrt()
}

pub fn compute_metrics(
  stats: &dyn StatisticsExt,
  returns: &Array2<f64>,
  expected_returns: &Array1<f64>,
  covariance: &Array2<f64>,
  weights: &[f64],
  confidence_level: f64,
  investment_term_days: u32,
) -> Result<RiskMetrics> {
  if !(confidence_level > 0.0 && confidence_level < 1.0) {
    return Err(RiskError::InvalidParameter {
      name: "confidence_level",
      reason: format!("{confidence_level} is outside (0, 1)"),
    });
  }
  if expected_returns.len() != weights.len() || covariance.nrows() != weights.len() {
    return Err(RiskError::InvalidPriceData(format!(
      "moments are sized for {} assets, allocation has {} weights",
      expected_returns.len(),
      weights.len()
    )));
  }

  let daily_return = portfolio_return(expected_returns, weights);
  // round-off can push a PSD quadratic form slightly below zero
  let daily_risk = portfolio_variance(covariance, weights).max(0.0).sqrt();

  let z = stats.inverse_normal_cdf(confidence_level);
  let parametric_var = z * daily_risk - daily_return;

  let realized = portfolio_returns(returns, weights)?;
  let historical_var = -stats.percentile(&realized.to_vec(), (1.0 - confidence_level) * 100.0);

  let daily_var = blend_var(parametric_var, historical_var);
  debug!(
    confidence_level,
    parametric_var, historical_var, daily_var, "blended daily VaR"
  );

  Ok(RiskMetrics {
    daily_return,
    daily_risk,
    annual_return: daily_return * TRADING_DAYS_PER_YEAR,
    annual_risk: daily_risk * TRADING_DAYS_PER_YEAR.sqrt(),
    confidence_level,
    parametric_var,
    historical_var,
    daily_var,
    weekly_var: daily_var * TRADING_DAYS_PER_WEEK.sqrt(),
    yearly_var: daily_var * yearly_scale(investment_term_days),
  })
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::Axis;
  use ndarray::array;
  use ndarray_stats::CorrelationExt;

  use super::*;
  use crate::stats::StatrsStatistics;

  fn sample() -> (Array2<f64>, Array1<f64>, Array2<f64>) {
    let returns = array![
      [0.010, -0.004],
      [-0.012, 0.006],
      [0.004, 0.001],
      [0.007, -0.009],
      [-0.020, 0.012],
      [0.015, 0.003],
      [-0.003, -0.002],
      [0.002, 0.008]
    ];
    let mu = returns.mean_axis(Axis(0)).unwrap();
    let cov = returns.t().cov(1.0).unwrap();
    (returns, mu, cov)
  }

  fn metrics(confidence: f64, term: u32) -> RiskMetrics {
    let (r, mu, cov) = sample();
    compute_metrics(&StatrsStatistics, &r, &mu, &cov, &[0.6, 0.4], confidence, term).unwrap()
  }

  #[test]
  fn daily_var_grows_with_confidence() {
    let mut last = f64::NEG_INFINITY;
    for c in [0.95, 0.96, 0.97, 0.98, 0.99] {
      let m = metrics(c, 30);
      assert!(m.daily_var >= last, "VaR fell at confidence {c}");
      last = m.daily_var;
    }
  }

  #[test]
  fn daily_var_is_the_larger_component() {
    let m = metrics(0.95, 30);
    assert_eq!(m.daily_var, m.parametric_var.max(m.historical_var));
  }

  #[test]
  fn horizon_scaling() {
    let m = metrics(0.95, 30);
    assert_abs_diff_eq!(m.weekly_var, m.daily_var * 5f64.sqrt(), epsilon = 1e-15);
    assert_abs_diff_eq!(m.yearly_var, m.daily_var * 30f64.sqrt(), epsilon = 1e-15);

    // capped at one trading year
    let long = metrics(0.95, 3650);
    assert_abs_diff_eq!(long.yearly_var, long.daily_var * 252f64.sqrt(), epsilon = 1e-15);
  }

  #[test]
  fn annualization() {
    let m = metrics(0.95, 365);
    assert_abs_diff_eq!(m.annual_return, m.daily_return * 252.0, epsilon = 1e-15);
    assert_abs_diff_eq!(m.annual_risk, m.daily_risk * 252f64.sqrt(), epsilon = 1e-15);
  }

  #[test]
  fn parametric_var_matches_closed_form() {
    let (_, mu, cov) = sample();
    let m = metrics(0.95, 30);
    let w = [0.6, 0.4];
    let sigma = portfolio_variance(&cov, &w).sqrt();
    let r = mu[0] * 0.6 + mu[1] * 0.4;
    assert_abs_diff_eq!(m.parametric_var, 1.644_853_6 * sigma - r, epsilon = 1e-8);
  }

  #[test]
  fn confidence_outside_unit_interval_is_rejected() {
    let (r, mu, cov) = sample();
    for c in [0.0, 1.0, 1.5, f64::NAN] {
      let err = compute_metrics(&StatrsStatistics, &r, &mu, &cov, &[0.5, 0.5], c, 30).unwrap_err();
      assert_eq!(err.status_code(), 422);
    }
  }

  #[test]
  fn portfolio_returns_check_shape() {
    let (r, ..) = sample();
    assert!(portfolio_returns(&r, &[1.0]).is_err());
    let p = portfolio_returns(&r, &[1.0, 0.0]).unwrap();
    assert_eq!(p, r.column(0));
  }
}
