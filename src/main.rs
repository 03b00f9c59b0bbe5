use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use portfolio_risk::EngineConfig;
use portfolio_risk::PriceProvider;
use portfolio_risk::RiskService;
use portfolio_risk::market::CsvPriceProvider;
use portfolio_risk::profile::AgeGroup;
use portfolio_risk::profile::InvestmentGoal;
use portfolio_risk::profile::InvestmentHorizon;
use portfolio_risk::profile::LossReaction;
use portfolio_risk::profile::QuestionnaireResponse;
use portfolio_risk::service::ApiError;
use portfolio_risk::service::CalculatorQuery;
use portfolio_risk::service::OptimizeQuery;
use serde::Serialize;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
  author,
  version,
  about = "Risk profiling, mean-variance optimization and VaR reporting",
  after_help = "EXAMPLES:
    # Questionnaire flow
    portfolio-risk --prices prices.csv questionnaire --age-group \"30-45\" \\
      --investment-goal Crecimiento --loss-reaction \"No hacer nada\" \\
      --investment-horizon \"1-3 años\"

    # Optimize for a named objective
    portfolio-risk --prices prices.csv optimize --investment-term 90 --objective min_risk

    # Calculator: exactly one of --target-return / --risk-limit
    portfolio-risk --prices prices.csv calculator --investment-term 90 --risk-limit 0.0004

The symbol basket is read from TICKERS (JSON array), e.g. TICKERS='[\"AAPL\",\"MSFT\"]'."
)]
struct Args {
  /// Wide CSV of adjusted closes: `date,SYM1,SYM2,...`
  #[arg(long, global = true)]
  prices: Option<PathBuf>,

  /// Fetch prices from Yahoo Finance instead of a CSV file
  #[cfg(feature = "yahoo")]
  #[arg(long, global = true)]
  yahoo: bool,

  /// Pretty-print the JSON response
  #[arg(long, global = true)]
  pretty: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Profile questionnaire answers and optimize for the resulting risk level
  Questionnaire {
    #[arg(long)]
    age_group: AgeGroup,
    #[arg(long)]
    investment_goal: InvestmentGoal,
    #[arg(long)]
    loss_reaction: LossReaction,
    #[arg(long)]
    investment_horizon: InvestmentHorizon,
  },
  /// Optimize for a named objective
  Optimize {
    /// Lookback in calendar days
    #[arg(long)]
    investment_term: i64,
    /// max_return | min_risk | max_sharpe | max_return_with_risk | min_risk_with_return
    #[arg(long)]
    objective: String,
    #[arg(long)]
    target_return: Option<f64>,
    #[arg(long)]
    risk_limit: Option<f64>,
    #[arg(long)]
    confidence_level: Option<f64>,
  },
  /// Minimize risk for a target return, or maximize return under a risk limit
  Calculator {
    #[arg(long)]
    investment_term: i64,
    #[arg(long)]
    target_return: Option<f64>,
    #[arg(long)]
    risk_limit: Option<f64>,
    #[arg(long)]
    confidence_level: Option<f64>,
  },
}

fn main() -> ExitCode {
  let env_filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("portfolio_risk=info"));
  tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_writer(std::io::stderr)
    .init();
  let args = Args::parse();

  match run(&args) {
    Ok(code) => code,
    Err(err) => {
      error!("{err:#}");
      ExitCode::FAILURE
    }
  }
}

fn run(args: &Args) -> anyhow::Result<ExitCode> {
  let config = EngineConfig::from_env().context("failed to load configuration")?;

  #[cfg(feature = "yahoo")]
  if args.yahoo {
    let provider = portfolio_risk::market::YahooPriceProvider::new()?;
    return dispatch(args, RiskService::new(config, provider));
  }

  let path = args
    .prices
    .as_ref()
    .context("--prices <csv> is required")?;
  let provider = CsvPriceProvider::from_path(path)?;
  dispatch(args, RiskService::new(config, provider))
}

fn dispatch<P: PriceProvider>(args: &Args, service: RiskService<P>) -> anyhow::Result<ExitCode> {
  match &args.command {
    Command::Questionnaire {
      age_group,
      investment_goal,
      loss_reaction,
      investment_horizon,
    } => emit(
      args.pretty,
      service.questionnaire(&QuestionnaireResponse {
        age_group: *age_group,
        investment_goal: *investment_goal,
        loss_reaction: *loss_reaction,
        investment_horizon: *investment_horizon,
      }),
    ),
    Command::Optimize {
      investment_term,
      objective,
      target_return,
      risk_limit,
      confidence_level,
    } => emit(
      args.pretty,
      service.optimize(&OptimizeQuery {
        investment_term: *investment_term,
        objective: objective.clone(),
        target_return: *target_return,
        risk_limit: *risk_limit,
        confidence_level: *confidence_level,
      }),
    ),
    Command::Calculator {
      investment_term,
      target_return,
      risk_limit,
      confidence_level,
    } => emit(
      args.pretty,
      service.calculator(&CalculatorQuery {
        investment_term: *investment_term,
        target_return: *target_return,
        risk_limit: *risk_limit,
        confidence_level: *confidence_level,
      }),
    ),
  }
}

fn emit<T: Serialize>(pretty: bool, response: Result<T, ApiError>) -> anyhow::Result<ExitCode> {
  let (json, code) = match &response {
    Ok(body) => (to_json(body, pretty)?, ExitCode::SUCCESS),
    Err(err) => (to_json(err, pretty)?, ExitCode::from(exit_code(err.status))),
  };
  println!("{json}");
  Ok(code)
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
  let json = if pretty {
    serde_json::to_string_pretty(value)?
  } else {
    serde_json::to_string(value)?
  };
  Ok(json)
}

/// 4xx → 2, 5xx → 1.
fn exit_code(status: u16) -> u8 {
  if (400..500).contains(&status) {
    2
  } else {
    1
  }
}
