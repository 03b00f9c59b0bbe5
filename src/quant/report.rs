//! # Risk Report
//!
//! $$
//! \Delta P = P_{last} - P_{first},\qquad \Delta\% = 100\,\frac{\Delta P}{P_{first}}
//! $$
//!
//! Serializable response payloads. This is the only place fractions become
//! two-decimal percentages.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use ndarray::Array2;
use serde::Serialize;

use super::pct;
use super::portfolio::ObjectiveKind;
use super::risk::RiskMetrics;
use super::round2;
use crate::market::PriceMatrix;

pub const NO_DATA_MESSAGE: &str = "No data available for this ticker in the given period.";

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ValueAtRisk {
  pub daily_var: f64,
  pub weekly_var: f64,
  pub yearly_var: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PricePoint {
  #[serde(serialize_with = "serialize_date")]
  pub date: NaiveDate,
  pub price: f64,
}

fn serialize_date<S: serde::Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
  s.collect_str(&date.format("%Y-%m-%d"))
}

/// Price path and change over the window for one asset.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssetSummary {
  pub historical_data: Vec<PricePoint>,
  pub first_price: f64,
  pub last_price: f64,
  pub absolute_change: f64,
  pub percentage_change: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AssetHistory {
  Available(AssetSummary),
  Unavailable { error: String },
}

/// Response body of `/optimize` and `/calculator`, and the `portfolio` part
/// of `/questionnaire`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RiskReport {
  pub objective: ObjectiveKind,
  pub investment_term_days: u32,
  /// Symbol → weight in percent.
  pub allocation: BTreeMap<String, f64>,
  pub expected_daily_return: f64,
  pub expected_daily_risk: f64,
  pub expected_annual_return: f64,
  pub expected_annual_risk: f64,
  pub confidence_level: f64,
  pub value_at_risk: ValueAtRisk,
  pub historical_data: BTreeMap<String, AssetHistory>,
  /// `None` where a zero-variance asset leaves the coefficient undefined.
  pub correlation_matrix: BTreeMap<String, BTreeMap<String, Option<f64>>>,
}

/// Response body of `/questionnaire`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuestionnaireReport {
  pub risk_level: f64,
  /// Horizon in calendar days.
  pub investment_term: u32,
  pub portfolio: RiskReport,
}

impl QuestionnaireReport {
  pub fn new(risk_level: f64, investment_term_days: u32, portfolio: RiskReport) -> Self {
    Self {
      risk_level,
      investment_term: investment_term_days,
      portfolio,
    }
  }
}

/// Per-asset price summary, missing observations skipped.
pub fn summarize_history(prices: &PriceMatrix) -> BTreeMap<String, AssetHistory> {
  let mut out = BTreeMap::new();
  for (j, symbol) in prices.symbols().iter().enumerate() {
    let points: Vec<PricePoint> = prices
      .dates()
      .iter()
      .zip(prices.column(j).iter())
      .filter(|(_, p)| p.is_finite())
      .map(|(&date, &price)| PricePoint { date, price })
      .collect();

    let history = match (points.first(), points.last()) {
      (Some(first), Some(last)) => {
        let absolute_change = last.price - first.price;
        AssetHistory::Available(AssetSummary {
          first_price: round2(first.price),
          last_price: round2(last.price),
          absolute_change: round2(absolute_change),
          percentage_change: round2(absolute_change / first.price * 100.0),
          historical_data: points
            .iter()
            .map(|p| PricePoint {
              date: p.date,
              price: round2(p.price),
            })
            .collect(),
        })
      }
      _ => AssetHistory::Unavailable {
        error: NO_DATA_MESSAGE.to_string(),
      },
    };
    out.insert(symbol.clone(), history);
  }
  out
}

/// Nested symbol → symbol → coefficient table.
pub fn correlation_table(
  symbols: &[String],
  corr: &Array2<f64>,
) -> BTreeMap<String, BTreeMap<String, Option<f64>>> {
  symbols
    .iter()
    .enumerate()
    .map(|(i, a)| {
      let row = symbols
        .iter()
        .enumerate()
        .map(|(j, b)| {
          let c = corr[[i, j]];
          (b.clone(), c.is_finite().then_some(c))
        })
        .collect();
      (a.clone(), row)
    })
    .collect()
}

/// Assemble the report from the pipeline outputs.
pub fn assemble(
  objective: ObjectiveKind,
  investment_term_days: u32,
  prices: &PriceMatrix,
  weights: &[f64],
  metrics: &RiskMetrics,
  corr: &Array2<f64>,
) -> RiskReport {
  let allocation = prices
    .symbols()
    .iter()
    .zip(weights.iter())
    .map(|(s, w)| (s.clone(), pct(*w)))
    .collect();

  RiskReport {
    objective,
    investment_term_days,
    allocation,
    expected_daily_return: pct(metrics.daily_return),
    expected_daily_risk: pct(metrics.daily_risk),
    expected_annual_return: pct(metrics.annual_return),
    expected_annual_risk: pct(metrics.annual_risk),
    confidence_level: metrics.confidence_level,
    value_at_risk: ValueAtRisk {
      daily_var: pct(metrics.daily_var),
      weekly_var: pct(metrics.weekly_var),
      yearly_var: pct(metrics.yearly_var),
    },
    historical_data: summarize_history(prices),
    correlation_matrix: correlation_table(prices.symbols(), corr),
  }
}

#[cfg(test)]
mod tests {
  use ndarray::array;
  use serde_json::json;

  use super::*;

  fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
  }

  fn prices() -> PriceMatrix {
    PriceMatrix::new(
      vec!["AAA".into(), "BBB".into()],
      vec![d(1), d(4), d(5)],
      array![[100.0, f64::NAN], [104.567, f64::NAN], [110.0, f64::NAN]],
    )
    .unwrap()
  }

  #[test]
  fn history_summary_and_missing_asset() {
    let h = summarize_history(&prices());

    let AssetHistory::Available(a) = &h["AAA"] else {
      panic!("AAA should have data");
    };
    assert_eq!(a.first_price, 100.0);
    assert_eq!(a.last_price, 110.0);
    assert_eq!(a.absolute_change, 10.0);
    assert_eq!(a.percentage_change, 10.0);
    assert_eq!(a.historical_data[1].price, 104.57);

    assert_eq!(
      serde_json::to_value(&h["BBB"]).unwrap(),
      json!({ "error": NO_DATA_MESSAGE })
    );
  }

  #[test]
  fn price_points_serialize_iso_dates() {
    let h = summarize_history(&prices());
    let v = serde_json::to_value(&h["AAA"]).unwrap();
    assert_eq!(v["historical_data"][0], json!({ "date": "2024-03-01", "price": 100.0 }));
  }

  #[test]
  fn undefined_correlation_is_null() {
    let symbols = vec!["AAA".to_string(), "BBB".to_string()];
    let table = correlation_table(&symbols, &array![[1.0, f64::NAN], [f64::NAN, f64::NAN]]);

    assert_eq!(table["AAA"]["AAA"], Some(1.0));
    let v = serde_json::to_value(&table).unwrap();
    assert!(v["AAA"]["BBB"].is_null());
  }

  #[test]
  fn assembled_report_uses_percentages() {
    let metrics = RiskMetrics {
      daily_return: 0.000_512,
      daily_risk: 0.012_34,
      annual_return: 0.129,
      annual_risk: 0.1959,
      confidence_level: 0.95,
      parametric_var: 0.02,
      historical_var: 0.018,
      daily_var: 0.02,
      weekly_var: 0.0447,
      yearly_var: 0.1095,
    };
    let report = assemble(
      ObjectiveKind::MinRisk,
      30,
      &prices(),
      &[0.333_33, 0.666_67],
      &metrics,
      &array![[1.0, 0.0], [0.0, 1.0]],
    );

    assert_eq!(report.allocation["AAA"], 33.33);
    assert_eq!(report.allocation["BBB"], 66.67);
    assert_eq!(report.expected_daily_return, 0.05);
    assert_eq!(report.value_at_risk.daily_var, 2.0);

    let v = serde_json::to_value(&report).unwrap();
    assert_eq!(v["objective"], "min_risk");
    assert_eq!(v["investment_term_days"], 30);
    assert_eq!(v["value_at_risk"]["yearly_var"], 10.95);
  }

  #[test]
  fn questionnaire_term_is_in_days() {
    let report = assemble(
      ObjectiveKind::MaxReturn,
      1825,
      &prices(),
      &[1.0, 0.0],
      &RiskMetrics {
        daily_return: 0.0,
        daily_risk: 0.0,
        annual_return: 0.0,
        annual_risk: 0.0,
        confidence_level: 0.95,
        parametric_var: 0.0,
        historical_var: 0.0,
        daily_var: 0.0,
        weekly_var: 0.0,
        yearly_var: 0.0,
      },
      &array![[1.0, 0.0], [0.0, 1.0]],
    );
    let body = QuestionnaireReport::new(0.75, 1825, report);
    assert_eq!(body.investment_term, 1825);
    let v = serde_json::to_value(&body).unwrap();
    assert_eq!(v["investment_term"], 1825);
    assert_eq!(v["portfolio"]["investment_term_days"], 1825);
  }
}
