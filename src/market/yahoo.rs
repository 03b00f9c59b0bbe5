//! Yahoo Finance adjusted-close history (`yahoo` feature).

use anyhow::Context;
use chrono::DateTime;
use chrono::NaiveDate;
use time::OffsetDateTime;
use tracing::debug;
use yahoo_finance_api as yahoo;

use super::PriceMatrix;
use super::PriceProvider;
use super::PriceSeries;
use super::collect_series;
use crate::error::Result;

/// [`PriceProvider`] backed by the Yahoo Finance chart API.
pub struct YahooPriceProvider {
  connector: yahoo::YahooConnector,
  runtime: tokio::runtime::Runtime,
}

impl YahooPriceProvider {
  pub fn new() -> anyhow::Result<Self> {
    let connector = yahoo::YahooConnector::new().context("failed to build Yahoo connector")?;
    let runtime = tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .context("failed to start runtime for Yahoo requests")?;
    Ok(Self { connector, runtime })
  }

  fn history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> anyhow::Result<PriceSeries> {
    let response = self
      .runtime
      .block_on(
        self
          .connector
          .get_quote_history(symbol, to_offset(start)?, to_offset(end)?),
      )
      .with_context(|| format!("quote history request for {symbol}"))?;
    let quotes = response
      .quotes()
      .with_context(|| format!("quote payload for {symbol}"))?;

    let mut points: Vec<(NaiveDate, f64)> = Vec::with_capacity(quotes.len());
    for quote in quotes {
      let date = DateTime::from_timestamp(quote.timestamp as i64, 0)
        .with_context(|| format!("bad timestamp {} for {symbol}", quote.timestamp))?
        .date_naive();
      if date >= end {
        continue;
      }
      match points.last_mut() {
        Some(last) if last.0 == date => last.1 = quote.adjclose,
        _ => points.push((date, quote.adjclose)),
      }
    }
    debug!(symbol, points = points.len(), "fetched yahoo history");

    Ok(PriceSeries::new(symbol, points)?)
  }
}

impl PriceProvider for YahooPriceProvider {
  fn fetch(&self, symbols: &[String], start: NaiveDate, end: NaiveDate) -> Result<PriceMatrix> {
    // Yahoo answers an empty range with an error, so one failure is a missing column.
    collect_series(symbols, |symbol| self.history(symbol, start, end))
  }
}

fn to_offset(date: NaiveDate) -> anyhow::Result<OffsetDateTime> {
  let ts = date
    .and_hms_opt(0, 0, 0)
    .context("midnight is always valid")?
    .and_utc()
    .timestamp();
  OffsetDateTime::from_unix_timestamp(ts).context("date out of range")
}
