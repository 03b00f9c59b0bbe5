//! # Stats
//!
//! $$
//! z_p = \Phi^{-1}(p),\qquad q_p(x) = x_{(\lfloor h \rfloor)} + (h - \lfloor h \rfloor)\,(x_{(\lceil h \rceil)} - x_{(\lfloor h \rfloor)}),\ h = \tfrac{p}{100}(n-1)
//! $$
//!
//! Default [`StatisticsExt`] backend: statrs for the normal quantile and
//! ndarray-stats for the linearly interpolated empirical percentile.

use ndarray::Array1;
use ndarray_stats::Quantile1dExt;
use ndarray_stats::interpolate::Linear;
use noisy_float::types::n64;
use statrs::distribution::ContinuousCDF;
use statrs::distribution::Normal;

use crate::traits::StatisticsExt;

/// Statistics backend built on statrs and ndarray-stats.
#[derive(Clone, Copy, Debug, Default)]
pub struct StatrsStatistics;

impl StatisticsExt for StatrsStatistics {
  fn inverse_normal_cdf(&self, p: f64) -> f64 {
    match Normal::new(0.0, 1.0) {
      Ok(std_normal) => std_normal.inverse_cdf(p),
      Err(_) => f64::NAN,
    }
  }

  /// Missing values are skipped; `q` outside `0..=100` is clamped.
  fn percentile(&self, sample: &[f64], q: f64) -> f64 {
    if q.is_nan() {
      return f64::NAN;
    }
    let mut observed: Array1<_> = sample
      .iter()
      .filter(|x| !x.is_nan())
      .map(|&x| n64(x))
      .collect();
    observed
      .quantile_mut(n64(q.clamp(0.0, 100.0) / 100.0), &Linear)
      .map_or(f64::NAN, |v| v.raw())
  }
}
