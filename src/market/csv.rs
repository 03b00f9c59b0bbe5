//! Wide-format CSV price files: `date,SYM1,SYM2,...`, one row per trading day,
//! empty cells for missing observations.

use std::path::Path;

use anyhow::Context;
use anyhow::bail;
use chrono::NaiveDate;
use ndarray::Array2;
use tracing::info;

use super::InMemoryPriceProvider;
use super::PriceMatrix;
use super::PriceProvider;
use crate::error::Result;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// [`PriceProvider`] over a CSV file loaded once at construction.
#[derive(Clone, Debug)]
pub struct CsvPriceProvider {
  inner: InMemoryPriceProvider,
}

impl CsvPriceProvider {
  pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
      .with_context(|| format!("failed to open price file {}", path.display()))?;
    let matrix =
      read_matrix(file).with_context(|| format!("failed to parse price file {}", path.display()))?;

    info!(
      path = %path.display(),
      days = matrix.n_dates(),
      assets = matrix.n_assets(),
      "loaded price file"
    );
    Ok(Self {
      inner: InMemoryPriceProvider::new(matrix),
    })
  }

  pub fn from_reader<R: std::io::Read>(reader: R) -> anyhow::Result<Self> {
    Ok(Self {
      inner: InMemoryPriceProvider::new(read_matrix(reader)?),
    })
  }

  pub fn matrix(&self) -> &PriceMatrix {
    self.inner.matrix()
  }
}

impl PriceProvider for CsvPriceProvider {
  fn fetch(&self, symbols: &[String], start: NaiveDate, end: NaiveDate) -> Result<PriceMatrix> {
    self.inner.fetch(symbols, start, end)
  }
}

fn read_matrix<R: std::io::Read>(reader: R) -> anyhow::Result<PriceMatrix> {
  let mut reader = ::csv::ReaderBuilder::new().trim(::csv::Trim::All).from_reader(reader);

  let headers = reader.headers().context("missing header row")?.clone();
  if headers.len() < 2 {
    bail!("header must be `date` followed by at least one symbol");
  }
  let symbols: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

  let mut rows: Vec<(NaiveDate, Vec<f64>)> = Vec::new();
  for (line, record) in reader.records().enumerate() {
    let record = record.with_context(|| format!("row {}", line + 2))?;
    let date = NaiveDate::parse_from_str(&record[0], DATE_FORMAT)
      .with_context(|| format!("row {}: bad date {:?}", line + 2, &record[0]))?;

    let mut values = Vec::with_capacity(symbols.len());
    for j in 0..symbols.len() {
      let cell = record.get(j + 1).unwrap_or("");
      let value = if cell.is_empty() {
        f64::NAN
      } else {
        cell
          .parse::<f64>()
          .with_context(|| format!("row {}: bad price {cell:?} for {}", line + 2, symbols[j]))?
      };
      values.push(value);
    }
    rows.push((date, values));
  }
  rows.sort_by_key(|(date, _)| *date);

  let dates: Vec<NaiveDate> = rows.iter().map(|(d, _)| *d).collect();
  let mut prices = Array2::from_elem((rows.len(), symbols.len()), f64::NAN);
  for (t, (_, values)) in rows.iter().enumerate() {
    for (j, v) in values.iter().enumerate() {
      prices[[t, j]] = *v;
    }
  }

  PriceMatrix::new(symbols, dates, prices).map_err(anyhow::Error::from)
}
