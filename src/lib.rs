//! # portfolio-risk
//!
//! $$
//! \text{answers} \to \ell \to \text{objective},\qquad
//! P \to (\mu, \Sigma) \to \mathbf{w}^\* \to \mathrm{VaR}_{1d,5d,1y}
//! $$
//!
//! Risk questionnaire scoring, long-only mean-variance optimization and
//! blended parametric/historical Value-at-Risk reporting.
//!
//! The entry points are [`service::RiskService`] for the request contract and
//! [`quant::portfolio::PortfolioEngine`] for running the pipeline on a price
//! matrix directly.

#[macro_use]
mod macros;

pub mod config;
pub mod error;
pub mod market;
pub mod profile;
pub mod quant;
pub mod service;
pub mod solver;
pub mod stats;
pub mod traits;

pub use config::EngineConfig;
pub use error::Result;
pub use error::RiskError;
pub use market::PriceMatrix;
pub use market::PriceProvider;
pub use quant::portfolio::ObjectiveSpec;
pub use quant::portfolio::PortfolioEngine;
pub use quant::report::RiskReport;
pub use service::RiskService;
