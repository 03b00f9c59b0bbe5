//! # Risk Profile
//!
//! $$
//! \ell = \operatorname{round}\!\left(\frac{s_{age} + s_{goal} + s_{loss}}{12}, 2\right)
//! $$
//!
//! Maps the four questionnaire answers onto a risk score, a normalized risk
//! level and an investment horizon, and picks the optimization objective the
//! questionnaire flow runs with.

use serde::Deserialize;
use serde::Serialize;

use crate::quant::portfolio::ObjectiveSpec;
use crate::quant::round2;

/// Highest attainable score (three scored questions, four points each).
pub const MAX_SCORE: u32 = 12;

/// Risk levels below this run [`ObjectiveSpec::MinRisk`].
pub const CONSERVATIVE_THRESHOLD: f64 = 0.33;
/// Risk levels below this (and above the conservative one) run [`ObjectiveSpec::MaxSharpe`].
pub const MODERATE_THRESHOLD: f64 = 0.66;

localized_enum! {
  /// Age bracket of the investor.
  AgeGroup {
    Over60("over_60") => "Más de 60" = 1,
    From46To60("46_60") => "46-60" = 2,
    From30To45("30_45") => "30-45" = 3,
    Under30("under_30") => "Menos de 30" = 4,
  }
}

localized_enum! {
  /// Primary investment goal.
  InvestmentGoal {
    CapitalPreservation("capital_preservation") => "Preservación de capital" = 1,
    IncomeGeneration("income_generation") => "Generación de ingresos" = 2,
    Growth("growth") => "Crecimiento" = 3,
    AggressiveGrowth("aggressive_growth") => "Crecimiento agresivo" = 4,
  }
}

localized_enum! {
  /// Reaction to a sharp drop in portfolio value.
  LossReaction {
    SellAll("sell_all") => "Vender todas las inversiones" = 1,
    SellSome("sell_some") => "Vender algunas inversiones" = 2,
    DoNothing("do_nothing") => "No hacer nada" = 3,
    InvestMore("invest_more") => "Invertir más" = 4,
  }
}

localized_enum! {
  /// Intended holding period. The value is the horizon in calendar days.
  InvestmentHorizon {
    LessThan1Year("less_than_1_year") => "Menos de 1 año" = 365,
    OneToThreeYears("1_3_years") => "1-3 años" = 1095,
    ThreeToFiveYears("3_5_years") => "3-5 años" = 1825,
    MoreThan5Years("more_than_5_years") => "Más de 5 años" = 3650,
  }
}

/// Body of `POST /questionnaire`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionnaireResponse {
  pub age_group: AgeGroup,
  pub investment_goal: InvestmentGoal,
  pub loss_reaction: LossReaction,
  pub investment_horizon: InvestmentHorizon,
}

/// Outcome of profiling one questionnaire.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RiskProfile {
  /// Raw score in `[3, 12]`.
  pub score: u32,
  /// `score / 12`, rounded to two decimals.
  pub risk_level: f64,
  pub investment_term_days: u32,
}

impl RiskProfile {
  pub fn from_response(response: &QuestionnaireResponse) -> Self {
    let score = score(response);
    Self {
      score,
      risk_level: normalize(score),
      investment_term_days: horizon_days(response.investment_horizon),
    }
  }

  pub fn objective(&self) -> ObjectiveSpec {
    objective_for_risk_level(self.risk_level)
  }
}

/// Sum of the age, goal and loss-reaction points. The horizon is not scored.
pub fn score(response: &QuestionnaireResponse) -> u32 {
  response.age_group.value() + response.investment_goal.value() + response.loss_reaction.value()
}

pub fn normalize(score: u32) -> f64 {
  round2(score as f64 / MAX_SCORE as f64)
}

pub fn horizon_days(horizon: InvestmentHorizon) -> u32 {
  horizon.value()
}

/// Objective the questionnaire flow optimizes for a given risk level.
pub fn objective_for_risk_level(risk_level: f64) -> ObjectiveSpec {
  if risk_level < CONSERVATIVE_THRESHOLD {
    ObjectiveSpec::MinRisk
  } else if risk_level < MODERATE_THRESHOLD {
    ObjectiveSpec::MaxSharpe
  } else {
    ObjectiveSpec::MaxReturn
  }
}
