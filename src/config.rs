//! # Configuration
//!
//! $$
//! \mathcal{B} = (s_1, \dots, s_n)
//! $$
//!
//! Process-wide, immutable engine configuration: the tradeable symbol basket
//! and the solver settings. Loaded once at startup and threaded explicitly
//! into the engine and the request handlers.

use std::collections::HashSet;

use tracing::info;

use crate::error::Result;
use crate::error::RiskError;

/// Confidence level used when a request does not supply one.
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// Ordered, duplicate-free list of tradeable symbols.
///
/// The order defines the index of every weight vector the engine produces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Basket {
  symbols: Vec<String>,
}

impl Basket {
  pub fn new<I, S>(symbols: I) -> Result<Self>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let symbols: Vec<String> = symbols
      .into_iter()
      .map(|s| s.into().trim().to_string())
      .collect();

    if symbols.is_empty() {
      return Err(RiskError::Config("symbol basket is empty".into()));
    }
    if let Some(blank) = symbols.iter().position(|s| s.is_empty()) {
      return Err(RiskError::Config(format!(
        "symbol at position {blank} is blank"
      )));
    }

    let mut seen = HashSet::with_capacity(symbols.len());
    for s in &symbols {
      if !seen.insert(s.as_str()) {
        return Err(RiskError::Config(format!("duplicate symbol {s}")));
      }
    }

    Ok(Self { symbols })
  }

  /// Parse the JSON array format used by the `TICKERS` variable.
  pub fn from_json(raw: &str) -> Result<Self> {
    let symbols: Vec<String> = serde_json::from_str(raw)
      .map_err(|e| RiskError::Config(format!("TICKERS must be a JSON array of strings: {e}")))?;
    Self::new(symbols)
  }

  pub fn symbols(&self) -> &[String] {
    &self.symbols
  }

}

/// Interior-point solver settings.
#[derive(Clone, Debug, PartialEq)]
pub struct SolverSettings {
  /// Print solver iterations.
  pub verbose: bool,
  /// Maximum interior-point iterations.
  pub max_iter: u32,
  /// Absolute duality-gap tolerance.
  pub tol_gap_abs: f64,
  /// Relative duality-gap tolerance.
  pub tol_gap_rel: f64,
}

impl Default for SolverSettings {
  fn default() -> Self {
    Self {
      verbose: false,
      max_iter: 200,
      tol_gap_abs: 1e-8,
      tol_gap_rel: 1e-8,
    }
  }
}

/// Complete engine configuration.
#[derive(Clone, Debug)]
pub struct EngineConfig {
  pub basket: Basket,
  pub solver: SolverSettings,
  pub default_confidence_level: f64,
}

impl EngineConfig {
  pub fn new(basket: Basket) -> Self {
    Self {
      basket,
      solver: SolverSettings::default(),
      default_confidence_level: DEFAULT_CONFIDENCE_LEVEL,
    }
  }

  /// Load configuration from the process environment (and `.env`, if present).
  pub fn from_env() -> Result<Self> {
    if let Ok(path) = dotenvy::dotenv() {
      info!("loaded environment from {}", path.display());
    }
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Build configuration from an arbitrary key lookup.
  pub fn from_lookup<F>(lookup: F) -> Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let tickers = lookup("TICKERS")
      .ok_or_else(|| RiskError::Config("TICKERS is not set".into()))?;
    let mut config = Self::new(Basket::from_json(&tickers)?);

    if let Some(v) = lookup("SOLVER_MAX_ITER") {
      config.solver.max_iter = parse_var("SOLVER_MAX_ITER", &v)?;
    }
    if let Some(v) = lookup("SOLVER_TOL_GAP_ABS") {
      config.solver.tol_gap_abs = parse_var("SOLVER_TOL_GAP_ABS", &v)?;
    }
    if let Some(v) = lookup("SOLVER_TOL_GAP_REL") {
      config.solver.tol_gap_rel = parse_var("SOLVER_TOL_GAP_REL", &v)?;
    }
    if let Some(v) = lookup("SOLVER_VERBOSE") {
      config.solver.verbose = parse_var("SOLVER_VERBOSE", &v)?;
    }

    info!(
      symbols = config.basket.symbols().len(),
      max_iter = config.solver.max_iter,
      "engine configuration loaded"
    );
    Ok(config)
  }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
  T: std::str::FromStr,
  T::Err: std::fmt::Display,
{
  raw
    .trim()
    .parse::<T>()
    .map_err(|e| RiskError::Config(format!("{key}={raw:?}: {e}")))
}
