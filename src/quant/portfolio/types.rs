//! # Portfolio Types
//!
//! $$
//! \mathbf{w} \in \Delta^{n-1} = \{\mathbf{w} \ge 0,\ \mathbf{1}^\top \mathbf{w} = 1\}
//! $$
//!
//! Objective selection and allocation containers.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Result;
use crate::error::RiskError;

/// Variance ceiling used by [`ObjectiveSpec::MaxSharpe`].
pub const SHARPE_RISK_BUDGET: f64 = 1.0;

/// Name of an optimization objective, as it appears on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
  MaxReturn,
  MinRisk,
  MaxSharpe,
  MaxReturnWithRisk,
  MinRiskWithReturn,
}

impl ObjectiveKind {
  pub const ALL: [ObjectiveKind; 5] = [
    ObjectiveKind::MaxReturn,
    ObjectiveKind::MinRisk,
    ObjectiveKind::MaxSharpe,
    ObjectiveKind::MaxReturnWithRisk,
    ObjectiveKind::MinRiskWithReturn,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      ObjectiveKind::MaxReturn => "max_return",
      ObjectiveKind::MinRisk => "min_risk",
      ObjectiveKind::MaxSharpe => "max_sharpe",
      ObjectiveKind::MaxReturnWithRisk => "max_return_with_risk",
      ObjectiveKind::MinRiskWithReturn => "min_risk_with_return",
    }
  }
}

impl fmt::Display for ObjectiveKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ObjectiveKind {
  type Err = RiskError;

  fn from_str(s: &str) -> Result<Self> {
    let s = s.trim();
    Self::ALL
      .into_iter()
      .find(|k| k.as_str() == s)
      .ok_or_else(|| RiskError::UnknownObjective(s.to_string()))
  }
}

/// Objective together with exactly the parameters it needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ObjectiveSpec {
  /// maximize `E·w`
  MaxReturn,
  /// minimize `wᵀΣw`
  MinRisk,
  /// maximize `E·w` s.t. `wᵀΣw <= SHARPE_RISK_BUDGET`
  MaxSharpe,
  /// maximize `E·w` s.t. `wᵀΣw <= risk_limit`
  MaxReturnWithRisk { risk_limit: f64 },
  /// minimize `wᵀΣw` s.t. `E·w >= target_return`
  MinRiskWithReturn { target_return: f64 },
}

impl ObjectiveSpec {
  /// Build from a named objective plus optional parameters. Parameters the
  /// objective does not use are ignored.
  pub fn from_parts(
    kind: ObjectiveKind,
    target_return: Option<f64>,
    risk_limit: Option<f64>,
  ) -> Result<Self> {
    Ok(match kind {
      ObjectiveKind::MaxReturn => ObjectiveSpec::MaxReturn,
      ObjectiveKind::MinRisk => ObjectiveSpec::MinRisk,
      ObjectiveKind::MaxSharpe => ObjectiveSpec::MaxSharpe,
      ObjectiveKind::MaxReturnWithRisk => ObjectiveSpec::MaxReturnWithRisk {
        risk_limit: risk_limit.ok_or(RiskError::MissingParameter {
          parameter: "risk_limit",
          objective: "max_return_with_risk",
        })?,
      },
      ObjectiveKind::MinRiskWithReturn => ObjectiveSpec::MinRiskWithReturn {
        target_return: target_return.ok_or(RiskError::MissingParameter {
          parameter: "target_return",
          objective: "min_risk_with_return",
        })?,
      },
    })
  }

  /// Infer the objective from which of the two parameters is present.
  /// Exactly one must be supplied.
  pub fn from_exclusive(target_return: Option<f64>, risk_limit: Option<f64>) -> Result<Self> {
    match (target_return, risk_limit) {
      (Some(target_return), None) => Ok(ObjectiveSpec::MinRiskWithReturn { target_return }),
      (None, Some(risk_limit)) => Ok(ObjectiveSpec::MaxReturnWithRisk { risk_limit }),
      (None, None) => Err(RiskError::ConflictingParameters(
        "Either target return or risk limit must be provided.",
      )),
      (Some(_), Some(_)) => Err(RiskError::ConflictingParameters(
        "Only one of target return or risk limit can be provided.",
      )),
    }
  }

  pub fn kind(&self) -> ObjectiveKind {
    match self {
      ObjectiveSpec::MaxReturn => ObjectiveKind::MaxReturn,
      ObjectiveSpec::MinRisk => ObjectiveKind::MinRisk,
      ObjectiveSpec::MaxSharpe => ObjectiveKind::MaxSharpe,
      ObjectiveSpec::MaxReturnWithRisk { .. } => ObjectiveKind::MaxReturnWithRisk,
      ObjectiveSpec::MinRiskWithReturn { .. } => ObjectiveKind::MinRiskWithReturn,
    }
  }

  /// Variance ceiling imposed by the objective, if any.
  pub fn risk_ceiling(&self) -> Option<f64> {
    match self {
      ObjectiveSpec::MaxSharpe => Some(SHARPE_RISK_BUDGET),
      ObjectiveSpec::MaxReturnWithRisk { risk_limit } => Some(*risk_limit),
      _ => None,
    }
  }

  /// `true` when the objective minimizes variance rather than maximizing return.
  pub fn minimizes_risk(&self) -> bool {
    matches!(
      self,
      ObjectiveSpec::MinRisk | ObjectiveSpec::MinRiskWithReturn { .. }
    )
  }
}

/// Long-only, fully invested weight vector in basket order.
#[derive(Clone, Debug, PartialEq)]
pub struct Allocation {
  pub weights: Vec<f64>,
}

impl Allocation {
  pub fn weights(&self) -> &[f64] {
    &self.weights
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kind_round_trips_through_its_name() {
    for kind in ObjectiveKind::ALL {
      assert_eq!(kind.as_str().parse::<ObjectiveKind>().unwrap(), kind);
    }
  }

  #[test]
  fn unknown_name_is_rejected() {
    assert_eq!(
      "max_alpha".parse::<ObjectiveKind>(),
      Err(RiskError::UnknownObjective("max_alpha".into()))
    );
  }

  #[test]
  fn parameterized_objectives_require_their_parameter() {
    let err = ObjectiveSpec::from_parts(ObjectiveKind::MaxReturnWithRisk, Some(0.01), None)
      .unwrap_err();
    assert_eq!(
      err,
      RiskError::MissingParameter {
        parameter: "risk_limit",
        objective: "max_return_with_risk",
      }
    );

    let err = ObjectiveSpec::from_parts(ObjectiveKind::MinRiskWithReturn, None, Some(0.5))
      .unwrap_err();
    assert!(matches!(err, RiskError::MissingParameter { parameter: "target_return", .. }));
  }

  #[test]
  fn unused_parameters_are_ignored() {
    let spec = ObjectiveSpec::from_parts(ObjectiveKind::MinRisk, Some(0.01), Some(0.2)).unwrap();
    assert_eq!(spec, ObjectiveSpec::MinRisk);
  }

  #[test]
  fn exclusive_parameters() {
    assert_eq!(
      ObjectiveSpec::from_exclusive(Some(0.001), None).unwrap(),
      ObjectiveSpec::MinRiskWithReturn {
        target_return: 0.001
      }
    );
    assert_eq!(
      ObjectiveSpec::from_exclusive(None, Some(0.0004)).unwrap(),
      ObjectiveSpec::MaxReturnWithRisk { risk_limit: 0.0004 }
    );
    assert!(matches!(
      ObjectiveSpec::from_exclusive(None, None),
      Err(RiskError::ConflictingParameters(_))
    ));
    assert!(matches!(
      ObjectiveSpec::from_exclusive(Some(0.1), Some(0.1)),
      Err(RiskError::ConflictingParameters(_))
    ));
  }

  #[test]
  fn sharpe_uses_fixed_budget() {
    assert_eq!(ObjectiveSpec::MaxSharpe.risk_ceiling(), Some(SHARPE_RISK_BUDGET));
    assert_eq!(ObjectiveSpec::MinRisk.risk_ceiling(), None);
    assert!(ObjectiveSpec::MinRiskWithReturn { target_return: 0.0 }.minimizes_risk());
  }

  #[test]
  fn kind_serializes_snake_case() {
    assert_eq!(
      serde_json::to_string(&ObjectiveKind::MinRiskWithReturn).unwrap(),
      "\"min_risk_with_return\""
    );
  }
}
