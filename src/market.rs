//! # Market Data
//!
//! $$
//! P \in \mathbb{R}^{T \times n},\qquad P_{t,i} = \text{adjusted close of asset } i \text{ on day } t
//! $$
//!
//! Price containers and the price-history collaborator interface. The engine
//! never fetches data itself; it consumes a [`PriceMatrix`] produced by a
//! [`PriceProvider`].

pub mod csv;
#[cfg(feature = "yahoo")]
pub mod yahoo;

use std::collections::BTreeMap;
use std::collections::HashMap;

use chrono::Duration;
use chrono::NaiveDate;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::Axis;
use tracing::warn;

pub use self::csv::CsvPriceProvider;
#[cfg(feature = "yahoo")]
pub use self::yahoo::YahooPriceProvider;
use crate::error::Result;
use crate::error::RiskError;

/// Date-ordered adjusted closes of one asset.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceSeries {
  pub symbol: String,
  pub points: Vec<(NaiveDate, f64)>,
}

impl PriceSeries {
  pub fn new(symbol: impl Into<String>, points: Vec<(NaiveDate, f64)>) -> Result<Self> {
    let symbol = symbol.into();
    if let Some(w) = points.windows(2).find(|w| w[0].0 >= w[1].0) {
      return Err(RiskError::InvalidPriceData(format!(
        "{symbol}: dates must be strictly increasing ({} then {})",
        w[0].0, w[1].0
      )));
    }
    Ok(Self { symbol, points })
  }
}

/// Dates × symbols matrix of adjusted closes. Missing observations are `NaN`.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceMatrix {
  symbols: Vec<String>,
  dates: Vec<NaiveDate>,
  prices: Array2<f64>,
}

impl PriceMatrix {
  pub fn new(symbols: Vec<String>, dates: Vec<NaiveDate>, prices: Array2<f64>) -> Result<Self> {
    if prices.nrows() != dates.len() || prices.ncols() != symbols.len() {
      return Err(RiskError::InvalidPriceData(format!(
        "price matrix is {}x{}, expected {}x{}",
        prices.nrows(),
        prices.ncols(),
        dates.len(),
        symbols.len()
      )));
    }
    if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
      return Err(RiskError::InvalidPriceData(format!(
        "dates must be strictly increasing ({} then {})",
        w[0], w[1]
      )));
    }
    Ok(Self {
      symbols,
      dates,
      prices,
    })
  }

  /// Matrix with the given columns and no rows.
  pub fn empty(symbols: Vec<String>) -> Self {
    let n = symbols.len();
    Self {
      symbols,
      dates: Vec::new(),
      prices: Array2::zeros((0, n)),
    }
  }

  /// Outer-join several series on date. Symbols without a series get an all-`NaN` column.
  pub fn from_series(symbols: &[String], series: &[PriceSeries]) -> Result<Self> {
    let mut by_date: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    let column: HashMap<&str, usize> = symbols
      .iter()
      .enumerate()
      .map(|(j, s)| (s.as_str(), j))
      .collect();

    for s in series {
      let j = *column.get(s.symbol.as_str()).ok_or_else(|| {
        RiskError::InvalidPriceData(format!("series for unknown symbol {}", s.symbol))
      })?;
      for &(date, price) in &s.points {
        by_date
          .entry(date)
          .or_insert_with(|| vec![f64::NAN; symbols.len()])[j] = price;
      }
    }

    let dates: Vec<NaiveDate> = by_date.keys().copied().collect();
    let mut prices = Array2::from_elem((dates.len(), symbols.len()), f64::NAN);
    for (t, row) in by_date.values().enumerate() {
      for (j, &p) in row.iter().enumerate() {
        prices[[t, j]] = p;
      }
    }

    Self::new(symbols.to_vec(), dates, prices)
  }

  pub fn symbols(&self) -> &[String] {
    &self.symbols
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn prices(&self) -> &Array2<f64> {
    &self.prices
  }

  pub fn column(&self, j: usize) -> ArrayView1<'_, f64> {
    self.prices.column(j)
  }

  pub fn n_dates(&self) -> usize {
    self.dates.len()
  }

  pub fn n_assets(&self) -> usize {
    self.symbols.len()
  }

  /// `true` when there is no trading day at all.
  pub fn is_empty(&self) -> bool {
    self.dates.is_empty()
  }

  /// Rows with `start <= date < end`.
  pub fn window(&self, start: NaiveDate, end: NaiveDate) -> Self {
    let rows: Vec<usize> = self
      .dates
      .iter()
      .enumerate()
      .filter(|(_, d)| **d >= start && **d < end)
      .map(|(i, _)| i)
      .collect();

    Self {
      symbols: self.symbols.clone(),
      dates: rows.iter().map(|&i| self.dates[i]).collect(),
      prices: self.prices.select(Axis(0), &rows),
    }
  }

  /// Reorder columns to `symbols`. Unknown symbols become all-`NaN` columns.
  pub fn select(&self, symbols: &[String]) -> Self {
    let mut prices = Array2::from_elem((self.n_dates(), symbols.len()), f64::NAN);
    for (j, symbol) in symbols.iter().enumerate() {
      if let Some(src) = self.symbols.iter().position(|s| s == symbol) {
        prices.column_mut(j).assign(&self.prices.column(src));
      }
    }

    Self {
      symbols: symbols.to_vec(),
      dates: self.dates.clone(),
      prices,
    }
  }
}

/// Price-history collaborator.
pub trait PriceProvider: Send + Sync {
  /// Adjusted closes for `symbols` over `[start, end)`, columns in `symbols` order.
  fn fetch(&self, symbols: &[String], start: NaiveDate, end: NaiveDate) -> Result<PriceMatrix>;
}

/// `[as_of - term_days, as_of)`, the window a request of `term_days` looks back over.
pub fn lookback_window(as_of: NaiveDate, term_days: u32) -> Result<(NaiveDate, NaiveDate)> {
  let start = as_of
    .checked_sub_signed(Duration::days(i64::from(term_days)))
    .ok_or_else(|| RiskError::InvalidParameter {
      name: "investment_term",
      reason: format!("{term_days} days before {as_of} is outside the supported calendar"),
    })?;
  Ok((start, as_of))
}

/// Gathers one series per symbol from a per-symbol source.
///
/// A symbol whose lookup fails is logged and left as an all-missing column.
/// When every lookup fails the source itself is treated as down.
pub fn collect_series<F>(symbols: &[String], mut lookup: F) -> Result<PriceMatrix>
where
  F: FnMut(&str) -> anyhow::Result<PriceSeries>,
{
  let mut series = Vec::with_capacity(symbols.len());
  let mut last_err = None;
  for symbol in symbols {
    match lookup(symbol.as_str()) {
      Ok(s) => series.push(s),
      Err(err) => {
        warn!(symbol = %symbol, "no price history: {err:#}");
        last_err = Some(err);
      }
    }
  }
  match last_err {
    Some(err) if series.is_empty() => Err(RiskError::Provider(format!(
      "every symbol lookup failed, last: {err:#}"
    ))),
    _ => PriceMatrix::from_series(symbols, &series),
  }
}

/// Provider over a matrix already held in memory.
#[derive(Clone, Debug)]
pub struct InMemoryPriceProvider {
  matrix: PriceMatrix,
}

impl InMemoryPriceProvider {
  pub fn new(matrix: PriceMatrix) -> Self {
    Self { matrix }
  }

  pub fn matrix(&self) -> &PriceMatrix {
    &self.matrix
  }
}

impl PriceProvider for InMemoryPriceProvider {
  fn fetch(&self, symbols: &[String], start: NaiveDate, end: NaiveDate) -> Result<PriceMatrix> {
    Ok(self.matrix.window(start, end).select(symbols))
  }
}
