//! # Service
//!
//! $$
//! \texttt{/questionnaire},\ \texttt{/optimize},\ \texttt{/calculator} \;\to\; \text{RiskReport} \;|\; \{\texttt{detail}\}
//! $$
//!
//! Framework-agnostic request contract. Each handler validates its query,
//! fetches the lookback window from the configured [`PriceProvider`] and runs
//! the [`PortfolioEngine`]. Failures come back as an [`ApiError`] carrying the
//! status code and the `{"detail": ...}` body an HTTP layer would send.

use chrono::NaiveDate;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;
use tracing::warn;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::error::RiskError;
use crate::market::PriceProvider;
use crate::market::lookback_window;
use crate::profile::QuestionnaireResponse;
use crate::profile::RiskProfile;
use crate::quant::portfolio::AnalysisRequest;
use crate::quant::portfolio::ObjectiveKind;
use crate::quant::portfolio::ObjectiveSpec;
use crate::quant::portfolio::PortfolioEngine;
use crate::quant::report::QuestionnaireReport;
use crate::quant::report::RiskReport;

/// Accepted range for a caller-supplied confidence level.
pub const MIN_CONFIDENCE_LEVEL: f64 = 0.90;
pub const MAX_CONFIDENCE_LEVEL: f64 = 0.99;

/// Query of `GET /optimize`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizeQuery {
  /// Lookback in calendar days.
  pub investment_term: i64,
  pub objective: String,
  #[serde(default)]
  pub target_return: Option<f64>,
  #[serde(default)]
  pub risk_limit: Option<f64>,
  #[serde(default)]
  pub confidence_level: Option<f64>,
}

/// Query of `GET|POST /calculator`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculatorQuery {
  pub investment_term: i64,
  #[serde(default)]
  pub target_return: Option<f64>,
  #[serde(default)]
  pub risk_limit: Option<f64>,
  #[serde(default)]
  pub confidence_level: Option<f64>,
}

/// Error response: HTTP status plus `{"detail": ...}` body.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ApiError {
  #[serde(skip)]
  pub status: u16,
  pub detail: String,
}

impl From<RiskError> for ApiError {
  fn from(err: RiskError) -> Self {
    Self {
      status: err.status_code(),
      detail: err.to_string(),
    }
  }
}

impl std::fmt::Display for ApiError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} {}", self.status, self.detail)
  }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Request handlers over one provider and one engine.
pub struct RiskService<P: PriceProvider> {
  config: EngineConfig,
  provider: P,
  engine: PortfolioEngine,
  as_of: Option<NaiveDate>,
}

impl<P: PriceProvider> RiskService<P> {
  pub fn new(config: EngineConfig, provider: P) -> Self {
    let engine = PortfolioEngine::new(&config);
    Self {
      config,
      provider,
      engine,
      as_of: None,
    }
  }

  /// Pin "today" for the lookback window instead of the system clock.
  pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
    self.as_of = Some(as_of);
    self
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  fn today(&self) -> NaiveDate {
    self.as_of.unwrap_or_else(|| Utc::now().date_naive())
  }

  /// `POST /questionnaire`
  pub fn questionnaire(&self, body: &QuestionnaireResponse) -> ApiResult<QuestionnaireReport> {
    respond("questionnaire", || {
      let profile = RiskProfile::from_response(body);
      info!(
        score = profile.score,
        risk_level = profile.risk_level,
        term_days = profile.investment_term_days,
        "questionnaire profiled"
      );
      let report = self.run(
        profile.objective(),
        profile.investment_term_days,
        self.config.default_confidence_level,
      )?;
      Ok(QuestionnaireReport::new(
        profile.risk_level,
        profile.investment_term_days,
        report,
      ))
    })
  }

  /// `GET /optimize`
  pub fn optimize(&self, query: &OptimizeQuery) -> ApiResult<RiskReport> {
    respond("optimize", || {
      let term = validate_term(query.investment_term)?;
      let confidence = self.confidence(query.confidence_level)?;
      let kind: ObjectiveKind = query.objective.parse()?;
      let objective = ObjectiveSpec::from_parts(kind, query.target_return, query.risk_limit)?;
      self.run(objective, term, confidence)
    })
  }

  /// `GET|POST /calculator`
  pub fn calculator(&self, query: &CalculatorQuery) -> ApiResult<RiskReport> {
    respond("calculator", || {
      let term = validate_term(query.investment_term)?;
      let confidence = self.confidence(query.confidence_level)?;
      let objective = ObjectiveSpec::from_exclusive(query.target_return, query.risk_limit)?;
      self.run(objective, term, confidence)
    })
  }

  fn confidence(&self, requested: Option<f64>) -> Result<f64> {
    let c = requested.unwrap_or(self.config.default_confidence_level);
    if !(MIN_CONFIDENCE_LEVEL..=MAX_CONFIDENCE_LEVEL).contains(&c) {
      return Err(RiskError::InvalidParameter {
        name: "confidence_level",
        reason: format!("{c} is outside [{MIN_CONFIDENCE_LEVEL}, {MAX_CONFIDENCE_LEVEL}]"),
      });
    }
    Ok(c)
  }

  fn run(&self, objective: ObjectiveSpec, term_days: u32, confidence_level: f64) -> Result<RiskReport> {
    let (start, end) = lookback_window(self.today(), term_days)?;
    let prices = self.provider.fetch(self.config.basket.symbols(), start, end)?;
    info!(
      %start,
      %end,
      days = prices.n_dates(),
      assets = prices.n_assets(),
      "fetched price window"
    );

    self.engine.analyze(
      &prices,
      &AnalysisRequest {
        objective,
        confidence_level,
        investment_term_days: term_days,
      },
    )
  }
}

fn validate_term(term: i64) -> Result<u32> {
  match u32::try_from(term) {
    Ok(t) if t > 0 => Ok(t),
    _ => Err(RiskError::InvalidParameter {
      name: "investment_term",
      reason: format!("{term} must be a positive number of days"),
    }),
  }
}

fn respond<T>(route: &'static str, handler: impl FnOnce() -> Result<T>) -> ApiResult<T> {
  handler().map_err(|err| {
    let err = ApiError::from(err);
    warn!(route, status = err.status, detail = %err.detail, "request failed");
    err
  })
}
