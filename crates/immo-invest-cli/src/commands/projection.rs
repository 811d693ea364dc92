use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use immo_invest_core::projection::break_even::{self, BreakEvenInput};
use immo_invest_core::projection::cashflow::{self, CashflowInput};
use immo_invest_core::projection::comparison::{self, ComparisonInput};
use immo_invest_core::projection::milestones::{self, MilestoneInput};
use immo_invest_core::projection::scenarios::{self, ScenarioInput};
use immo_invest_core::projection::schedule::{self, ScheduleInput};
use immo_invest_core::projection::sensitivity::{self, SensitivityInput};
use immo_invest_core::property::{LoanTerms, PropertyFinancials};
use immo_invest_core::EngineConfig;

use super::InputArgs;
use crate::input;

/// Arguments for the monthly cashflow
#[derive(Args)]
pub struct CashflowArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Purchase price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Monthly cold rent
    #[arg(long)]
    pub rent: Option<Decimal>,

    /// Monthly service charge (Hausgeld)
    #[arg(long)]
    pub service_charge: Option<Decimal>,

    /// Equity brought in
    #[arg(long)]
    pub equity: Option<Decimal>,

    /// Interest rate in % p.a. (defaults to the configured rate)
    #[arg(long)]
    pub interest_rate: Option<Decimal>,

    /// Initial amortization in % p.a. (defaults to the configured rate)
    #[arg(long)]
    pub amortization_rate: Option<Decimal>,
}

pub fn run_cashflow(
    args: CashflowArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let cashflow_input: CashflowInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let price = args
            .price
            .ok_or("--price is required (or provide --input)")?;
        let rent = args.rent.ok_or("--rent is required (or provide --input)")?;

        CashflowInput {
            financials: PropertyFinancials {
                purchase_price: price,
                monthly_rent: rent,
                monthly_service_charge: args.service_charge.unwrap_or(Decimal::ZERO),
                living_area_sqm: None,
                construction_year: None,
            },
            loan: LoanTerms::new(
                args.equity.unwrap_or(Decimal::ZERO),
                args.interest_rate
                    .unwrap_or(config.default_interest_rate_pct),
                args.amortization_rate
                    .unwrap_or(config.default_amortization_rate_pct),
            ),
        }
    };

    let result = cashflow::cashflow_analysis(&cashflow_input, config)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the amortization schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON input file (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Horizon in years (overrides the input and the config)
    #[arg(long)]
    pub years: Option<u32>,
}

pub fn run_schedule(
    args: ScheduleArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut schedule_input: ScheduleInput = input::read_input(args.input.as_deref(), "schedule")?;
    if args.years.is_some() {
        schedule_input.years = args.years;
    }
    let result = schedule::amortization_schedule(&schedule_input, config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_break_even(
    args: InputArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let be_input: BreakEvenInput = input::read_input(args.input.as_deref(), "break-even")?;
    let result = break_even::break_even_analysis(&be_input, config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_sensitivity(
    args: InputArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let sens_input: SensitivityInput = input::read_input(args.input.as_deref(), "sensitivity")?;
    let result = sensitivity::sensitivity_analysis(&sens_input, config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_scenarios(
    args: InputArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let scenario_input: ScenarioInput = input::read_input(args.input.as_deref(), "scenarios")?;
    let result = scenarios::scenario_comparison(&scenario_input, config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_milestones(
    args: InputArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let ms_input: MilestoneInput = input::read_input(args.input.as_deref(), "milestones")?;
    let result = milestones::milestone_analysis(&ms_input, config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_compare(
    args: InputArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let cmp_input: ComparisonInput = input::read_input(args.input.as_deref(), "compare")?;
    let result = comparison::investment_comparison(&cmp_input, config)?;
    Ok(serde_json::to_value(result)?)
}
