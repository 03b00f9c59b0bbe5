//! # Portfolio
//!
//! $$
//! \sigma_p^2 = \mathbf{w}^\top \Sigma \mathbf{w}
//! $$
//!
//! Returns estimation, long-only portfolio optimization and the engine that
//! chains them into a risk report.

pub mod data;
pub mod engine;
pub mod optimizers;
pub mod types;

pub use data::ReturnsData;
pub use data::compute_returns;
pub use data::correlation_matrix;
pub use engine::AnalysisRequest;
pub use engine::PortfolioEngine;
pub use optimizers::optimize;
pub use types::Allocation;
pub use types::ObjectiveKind;
pub use types::ObjectiveSpec;
