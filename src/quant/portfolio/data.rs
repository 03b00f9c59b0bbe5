//! # Portfolio Data Utilities
//!
//! $$
//! r_{t,i} = \frac{P_{t,i}}{P_{t-1,i}} - 1,\qquad
//! \Sigma_{ij} = \frac{1}{T-1}\sum_t (r_{t,i}-\bar r_i)(r_{t,j}-\bar r_j)
//! $$
//!
//! Return preprocessing and covariance/correlation construction.

use chrono::NaiveDate;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::Axis;
use ndarray_stats::CorrelationExt;
use tracing::debug;

use crate::error::Result;
use crate::error::RiskError;
use crate::market::PriceMatrix;

/// Daily returns together with the moments the optimizer needs.
#[derive(Clone, Debug)]
pub struct ReturnsData {
  /// `T x n` simple returns, complete rows only.
  pub returns: Array2<f64>,
  /// Date of each returns row (the later of the two prices).
  pub dates: Vec<NaiveDate>,
  /// Per-asset arithmetic mean of daily returns.
  pub expected_returns: Array1<f64>,
  /// Sample covariance (ddof = 1).
  pub covariance: Array2<f64>,
}

impl ReturnsData {
  pub fn n_assets(&self) -> usize {
    self.returns.ncols()
  }

  pub fn n_observations(&self) -> usize {
    self.returns.nrows()
  }
}

/// Day-over-day percentage change. The first row and any row with a missing
/// or non-finite value are dropped.
pub fn simple_returns(prices: &PriceMatrix) -> (Array2<f64>, Vec<NaiveDate>) {
  let p = prices.prices();
  let n = prices.n_assets();
  let mut rows: Vec<f64> = Vec::new();
  let mut dates = Vec::new();

  for t in 1..prices.n_dates() {
    let row: Vec<f64> = (0..n).map(|j| p[[t, j]] / p[[t - 1, j]] - 1.0).collect();
    if row.iter().all(|r| r.is_finite()) {
      rows.extend(row);
      dates.push(prices.dates()[t]);
    }
  }

  let returns = Array2::from_shape_vec((dates.len(), n), rows)
    .unwrap_or_else(|_| Array2::zeros((0, n)));
  (returns, dates)
}

/// Returns matrix, expected returns and covariance of a price matrix.
pub fn compute_returns(prices: &PriceMatrix) -> Result<ReturnsData> {
  if prices.is_empty() {
    return Err(RiskError::InsufficientData(
      "No data fetched for the given investment term.".into(),
    ));
  }

  let (returns, dates) = simple_returns(prices);
  if returns.nrows() < 2 {
    return Err(RiskError::InsufficientData(format!(
      "Not enough complete trading days in the given investment term: {} return observation(s), at least 2 required.",
      returns.nrows()
    )));
  }

  let expected_returns = returns
    .mean_axis(Axis(0))
    .ok_or_else(|| RiskError::InsufficientData("empty returns matrix".into()))?;
  // Variables are rows for CorrelationExt, observations are columns.
  let covariance = returns
    .t()
    .cov(1.0)
    .map_err(|e| RiskError::InsufficientData(e.to_string()))?;

  debug!(
    observations = returns.nrows(),
    assets = returns.ncols(),
    "computed returns and covariance"
  );

  Ok(ReturnsData {
    returns,
    dates,
    expected_returns,
    covariance,
  })
}

/// Pearson correlation of the returns columns. Zero-variance assets give `NaN`.
pub fn correlation_matrix(returns: &Array2<f64>) -> Result<Array2<f64>> {
  if returns.nrows() < 2 {
    return Err(RiskError::InsufficientData(
      "correlation needs at least 2 return observations".into(),
    ));
  }
  let mut corr = returns
    .t()
    .pearson_correlation()
    .map_err(|e| RiskError::InsufficientData(e.to_string()))?;

  for i in 0..corr.nrows() {
    for j in 0..corr.ncols() {
      let c = corr[[i, j]];
      if c.is_finite() {
        corr[[i, j]] = c.clamp(-1.0, 1.0);
      }
    }
  }
  Ok(corr)
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;

  fn dates(n: usize) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..n).map(|i| start + chrono::Duration::days(i as i64)).collect()
  }

  fn matrix(prices: Array2<f64>) -> PriceMatrix {
    let n = prices.ncols();
    let symbols = (0..n).map(|i| format!("S{i}")).collect();
    PriceMatrix::new(symbols, dates(prices.nrows()), prices).unwrap()
  }

  #[test]
  fn pct_change_drops_first_row() {
    let m = matrix(array![[100.0, 50.0], [110.0, 50.0], [99.0, 55.0]]);
    let (r, d) = simple_returns(&m);

    assert_eq!(r.nrows(), m.n_dates() - 1);
    assert_eq!(d, &m.dates()[1..]);
    assert_abs_diff_eq!(r[[0, 0]], 0.1, epsilon = 1e-12);
    assert_abs_diff_eq!(r[[1, 0]], -0.1, epsilon = 1e-12);
    assert_abs_diff_eq!(r[[1, 1]], 0.1, epsilon = 1e-12);
  }

  #[test]
  fn rows_with_gaps_are_dropped() {
    let m = matrix(array![[100.0, 50.0], [f64::NAN, 51.0], [102.0, 52.0], [103.0, 53.0]]);
    let (r, d) = simple_returns(&m);

    // day 1 and day 2 both touch the missing price
    assert_eq!(r.nrows(), 1);
    assert_eq!(d, vec![m.dates()[3]]);
  }

  #[test]
  fn moments_match_hand_computation() {
    let m = matrix(array![[100.0, 100.0], [101.0, 99.0], [102.01, 99.99], [100.99, 98.01]]);
    let data = compute_returns(&m).unwrap();

    let r = &data.returns;
    let mean0 = r.column(0).sum() / 3.0;
    assert_abs_diff_eq!(data.expected_returns[0], mean0, epsilon = 1e-12);

    let cov01: f64 = (0..3)
      .map(|t| (r[[t, 0]] - mean0) * (r[[t, 1]] - data.expected_returns[1]))
      .sum::<f64>()
      / 2.0;
    assert_abs_diff_eq!(data.covariance[[0, 1]], cov01, epsilon = 1e-12);
    assert_abs_diff_eq!(data.covariance[[0, 1]], data.covariance[[1, 0]], epsilon = 1e-15);
    assert!(data.covariance[[0, 0]] >= 0.0 && data.covariance[[1, 1]] >= 0.0);
  }

  #[test]
  fn empty_matrix_is_insufficient_data() {
    let m = PriceMatrix::empty(vec!["A".into(), "B".into()]);
    assert!(matches!(compute_returns(&m), Err(RiskError::InsufficientData(_))));
  }

  #[test]
  fn single_return_row_is_insufficient_data() {
    let m = matrix(array![[100.0], [101.0]]);
    let err = compute_returns(&m).unwrap_err();
    assert_eq!(err.status_code(), 400);
  }

  #[test]
  fn correlation_is_unit_diagonal_and_symmetric() {
    let m = matrix(array![[100.0, 10.0, 5.0], [101.0, 10.2, 5.0], [100.5, 10.1, 5.0], [102.0, 10.5, 5.0]]);
    let data = compute_returns(&m).unwrap();
    let corr = correlation_matrix(&data.returns).unwrap();

    assert_abs_diff_eq!(corr[[0, 0]], 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(corr[[0, 1]], corr[[1, 0]], epsilon = 1e-12);
    assert!(corr[[0, 1]] > 0.9);
    // constant price → zero variance
    assert!(corr[[0, 2]].is_nan());
  }
}
