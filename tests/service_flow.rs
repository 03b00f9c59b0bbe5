use chrono::Duration;
use chrono::NaiveDate;
use ndarray::Array2;
use portfolio_risk::EngineConfig;
use portfolio_risk::PriceMatrix;
use portfolio_risk::RiskService;
use portfolio_risk::config::Basket;
use portfolio_risk::market::CsvPriceProvider;
use portfolio_risk::market::InMemoryPriceProvider;
use portfolio_risk::profile::QuestionnaireResponse;
use portfolio_risk::quant::report::AssetHistory;
use portfolio_risk::service::CalculatorQuery;
use portfolio_risk::service::OptimizeQuery;
use serde_json::json;

const SYMBOLS: [&str; 3] = ["BOND", "BLUE", "TECH"];

fn as_of() -> NaiveDate {
  NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
}

/// Roughly 200 calendar days of three assets with rising drift and volatility.
fn market() -> PriceMatrix {
  let days = 200;
  let start = as_of() - Duration::days(days as i64);
  let dates = (0..days).map(|i| start + Duration::days(i as i64)).collect();
  let prices = Array2::from_shape_fn((days, 3), |(t, j)| {
    let t = t as f64;
    match j {
      0 => 100.0 * (1.0 + 0.0001 * t + 0.001 * (t * 2.1).sin()),
      1 => 60.0 * (1.0 + 0.0006 * t + 0.006 * (t * 1.1).cos() + 0.003 * (t * 0.37).sin()),
      _ => 25.0 * (1.0 + 0.0018 * t + 0.025 * (t * 0.6).sin() + 0.01 * (t * 2.9).cos()),
    }
  });
  PriceMatrix::new(SYMBOLS.iter().map(|s| s.to_string()).collect(), dates, prices).unwrap()
}

fn service() -> RiskService<InMemoryPriceProvider> {
  let config = EngineConfig::new(Basket::new(SYMBOLS).unwrap());
  RiskService::new(config, InMemoryPriceProvider::new(market())).with_as_of(as_of())
}

fn optimize(objective: &str, term: i64) -> OptimizeQuery {
  OptimizeQuery {
    investment_term: term,
    objective: objective.to_string(),
    ..Default::default()
  }
}

fn allocation_total(report: &portfolio_risk::RiskReport) -> f64 {
  report.allocation.values().sum()
}

#[test]
fn every_objective_returns_a_fully_invested_report() {
  let s = service();
  let queries = [
    optimize("max_return", 90),
    optimize("min_risk", 90),
    optimize("max_sharpe", 90),
    OptimizeQuery {
      risk_limit: Some(0.0002),
      ..optimize("max_return_with_risk", 90)
    },
    OptimizeQuery {
      target_return: Some(0.0005),
      ..optimize("min_risk_with_return", 90)
    },
  ];

  for q in queries {
    let report = s.optimize(&q).unwrap_or_else(|e| panic!("{}: {}", q.objective, e));
    assert!((allocation_total(&report) - 100.0).abs() < 0.05);
    assert!(report.allocation.values().all(|w| *w >= 0.0));
    assert_eq!(report.objective.as_str(), q.objective);
  }
}

#[test]
fn extra_parameter_is_ignored() {
  let s = service();
  let plain = s.optimize(&optimize("min_risk", 90)).unwrap();
  let extra = s
    .optimize(&OptimizeQuery {
      risk_limit: Some(0.5),
      ..optimize("min_risk", 90)
    })
    .unwrap();
  assert_eq!(plain, extra);
}

#[test]
fn min_risk_is_no_riskier_than_max_return() {
  let s = service();
  let low = s.optimize(&optimize("min_risk", 120)).unwrap();
  let high = s.optimize(&optimize("max_return", 120)).unwrap();
  assert!(low.expected_annual_risk <= high.expected_annual_risk);
}

#[test]
fn higher_confidence_never_lowers_var() {
  let s = service();
  let at = |c: f64| {
    s.optimize(&OptimizeQuery {
      confidence_level: Some(c),
      ..optimize("max_sharpe", 120)
    })
    .unwrap()
    .value_at_risk
    .daily_var
  };
  assert!(at(0.99) >= at(0.95));
}

#[test]
fn missing_risk_limit_is_reported_before_fetching() {
  let err = service()
    .optimize(&optimize("max_return_with_risk", 30))
    .unwrap_err();
  assert_eq!(err.status, 400);
  assert_eq!(
    serde_json::to_value(&err).unwrap(),
    json!({ "detail": "risk_limit must be provided for max_return_with_risk objective." })
  );
}

#[test]
fn window_without_prices_is_insufficient_data() {
  let config = EngineConfig::new(Basket::new(SYMBOLS).unwrap());
  let far_future = as_of() + Duration::days(3650);
  let s = RiskService::new(config, InMemoryPriceProvider::new(market())).with_as_of(far_future);

  let err = s.optimize(&optimize("min_risk", 30)).unwrap_err();
  assert_eq!(err.status, 400);
  assert_eq!(err.detail, "No data fetched for the given investment term.");
}

#[test]
fn unreachable_target_is_an_optimization_failure() {
  let err = service()
    .calculator(&CalculatorQuery {
      investment_term: 90,
      target_return: Some(0.5),
      ..Default::default()
    })
    .unwrap_err();
  assert_eq!(err.status, 400);
  assert!(err.detail.starts_with("Optimization failed. Status:"));
}

#[test]
fn unknown_basket_symbol_leaves_no_complete_rows() {
  let config = EngineConfig::new(Basket::new(["BOND", "BLUE", "GONE"]).unwrap());
  let s = RiskService::new(config, InMemoryPriceProvider::new(market())).with_as_of(as_of());

  // the all-missing column leaves no complete return rows
  let err = s.optimize(&optimize("min_risk", 90)).unwrap_err();
  assert_eq!(err.status, 400);
}

#[test]
fn report_serializes_the_documented_shape() {
  let report = service().optimize(&optimize("max_sharpe", 60)).unwrap();
  let v = serde_json::to_value(&report).unwrap();

  for key in [
    "objective",
    "investment_term_days",
    "allocation",
    "expected_daily_return",
    "expected_daily_risk",
    "expected_annual_return",
    "expected_annual_risk",
    "confidence_level",
    "value_at_risk",
    "historical_data",
    "correlation_matrix",
  ] {
    assert!(v.get(key).is_some(), "missing {key}");
  }
  assert!(v["value_at_risk"].get("weekly_var").is_some());
  let diag = v["correlation_matrix"]["TECH"]["TECH"].as_f64().unwrap();
  assert!((diag - 1.0).abs() < 1e-9);

  let AssetHistory::Available(bond) = &report.historical_data["BOND"] else {
    panic!("BOND should have prices");
  };
  assert!(bond.historical_data.len() >= 59);
  assert_eq!(bond.historical_data.last().map(|p| p.price), Some(bond.last_price));
}

#[test]
fn questionnaire_accepts_localized_body() {
  let body: QuestionnaireResponse = serde_json::from_value(json!({
    "age_group": "Más de 60",
    "investment_goal": "Preservación de capital",
    "loss_reaction": "Vender todas las inversiones",
    "investment_horizon": "Menos de 1 año"
  }))
  .unwrap();

  let report = service().questionnaire(&body).unwrap();
  assert_eq!(report.risk_level, 0.25);
  assert_eq!(report.investment_term, 365);
  assert_eq!(report.portfolio.objective.as_str(), "min_risk");
  assert_eq!(report.portfolio.confidence_level, 0.95);
}

#[test]
fn csv_provider_drives_the_same_pipeline() {
  let m = market();
  let mut csv = String::from("date,BOND,BLUE,TECH\n");
  for (t, date) in m.dates().iter().enumerate() {
    let row = m.prices().row(t);
    csv.push_str(&format!("{date},{},{},{}\n", row[0], row[1], row[2]));
  }
  let provider = CsvPriceProvider::from_reader(csv.as_bytes()).unwrap();
  let config = EngineConfig::new(Basket::new(SYMBOLS).unwrap());
  let from_csv = RiskService::new(config, provider).with_as_of(as_of());

  let a = from_csv.optimize(&optimize("min_risk", 90)).unwrap();
  let b = service().optimize(&optimize("min_risk", 90)).unwrap();
  assert_eq!(a.allocation, b.allocation);
}
