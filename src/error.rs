//! # Errors
//!
//! $$
//! \text{request} \mapsto \text{report} \;|\; (\text{status}, \text{detail})
//! $$
//!
//! Error taxonomy shared by every stage of the pipeline. All variants are
//! recoverable and map onto an HTTP-style status code.

use thiserror::Error;

/// Error type for profiling, optimization and reporting.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RiskError {
  /// No (or too few) prices for the requested window.
  #[error("{0}")]
  InsufficientData(String),

  /// The objective needs a parameter that was not supplied.
  #[error("{parameter} must be provided for {objective} objective.")]
  MissingParameter {
    parameter: &'static str,
    objective: &'static str,
  },

  /// Both or neither of `target_return` / `risk_limit` were supplied.
  #[error("{0}")]
  ConflictingParameters(&'static str),

  /// Objective name outside the supported set.
  #[error("Invalid optimization objective: {0}")]
  UnknownObjective(String),

  /// The solver did not reach an optimal or almost-optimal status.
  #[error("Optimization failed. Status: {0}")]
  InfeasibleOrUnbounded(String),

  /// A query parameter is out of its accepted range.
  #[error("Invalid parameter {name}: {reason}")]
  InvalidParameter { name: &'static str, reason: String },

  /// The price matrix itself is malformed.
  #[error("Invalid price data: {0}")]
  InvalidPriceData(String),

  /// The market-data collaborator failed.
  #[error("Price provider error: {0}")]
  Provider(String),

  /// The solver backend could not be set up.
  #[error("Solver error: {0}")]
  Solver(String),

  /// Startup configuration is invalid.
  #[error("Configuration error: {0}")]
  Config(String),
}

impl RiskError {
  /// HTTP status the request layer should answer with.
  pub fn status_code(&self) -> u16 {
    match self {
      RiskError::InsufficientData(_)
      | RiskError::MissingParameter { .. }
      | RiskError::ConflictingParameters(_)
      | RiskError::UnknownObjective(_)
      | RiskError::InfeasibleOrUnbounded(_)
      | RiskError::InvalidPriceData(_) => 400,
      RiskError::InvalidParameter { .. } => 422,
      RiskError::Provider(_) => 502,
      RiskError::Solver(_) | RiskError::Config(_) => 500,
    }
  }
}

/// Collaborator failures (CSV files, remote feeds) arrive as `anyhow` chains.
impl From<anyhow::Error> for RiskError {
  fn from(err: anyhow::Error) -> Self {
    RiskError::Provider(format!("{err:#}"))
  }
}

/// Result type for portfolio-risk operations.
pub type Result<T> = std::result::Result<T, RiskError>;
