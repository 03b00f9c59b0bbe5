//! # Quant
//!
//! $$
//! \mu_p = \mu^\top \mathbf{w},\qquad \sigma_p = \sqrt{\mathbf{w}^\top \Sigma \mathbf{w}}
//! $$
//!
//! Quantitative core: returns estimation, portfolio optimization, risk
//! metrics and report assembly.

pub mod portfolio;
pub mod report;
pub mod risk;

/// Trading days per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Trading days per week used for weekly VaR scaling.
pub const TRADING_DAYS_PER_WEEK: f64 = 5.0;

/// Round to two decimals.
pub fn round2(x: f64) -> f64 {
  (x * 100.0).round() / 100.0
}

/// Express a fraction as a percentage rounded to two decimals.
pub fn pct(x: f64) -> f64 {
  round2(x * 100.0)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rounding_helpers() {
    assert_eq!(round2(0.8333), 0.83);
    assert_eq!(round2(-1.005_1), -1.01);
    assert_eq!(pct(0.012_345), 1.23);
    assert!(pct(f64::NAN).is_nan());
  }
}
