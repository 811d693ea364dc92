use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::EngineConfig;
use crate::property::{LoanTerms, PropertyFinancials};
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::ImmoResult;

use super::schedule::{build_schedule, AmortizationYearEntry};

/// First year in which each event happens; None when it never does within
/// the horizon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestones {
    pub loan_25_pct_repaid: Option<u32>,
    pub loan_50_pct_repaid: Option<u32>,
    pub loan_75_pct_repaid: Option<u32>,
    pub loan_fully_repaid: Option<u32>,
    pub first_positive_cashflow: Option<u32>,
    /// Accumulated equity reaches twice the initial equity
    pub equity_doubled: Option<u32>,
    pub wealth_100k: Option<u32>,
    pub wealth_250k: Option<u32>,
    pub wealth_500k: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneInput {
    pub financials: PropertyFinancials,
    pub loan: LoanTerms,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years: Option<u32>,
}

/// Scan a long schedule for the investment's key milestones.
pub fn find_milestones(
    financials: &PropertyFinancials,
    loan: &LoanTerms,
    years: u32,
    config: &EngineConfig,
) -> ImmoResult<Milestones> {
    let schedule = build_schedule(
        financials,
        loan,
        years,
        config.default_rent_growth_pct,
        config.default_value_growth_pct,
        config,
    )?;
    Ok(scan(
        &schedule.years,
        schedule.summary.financed_amount,
        loan.equity,
    ))
}

pub fn milestone_analysis(
    input: &MilestoneInput,
    config: &EngineConfig,
) -> ImmoResult<ComputationOutput<Milestones>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let years = input.years.unwrap_or(config.milestone_years);

    let milestones = find_milestones(&input.financials, &input.loan, years, config)?;
    if milestones.loan_fully_repaid.is_none() {
        warnings.push(format!("Loan is not fully repaid within {years} years"));
    }
    if milestones.first_positive_cashflow.is_none() {
        warnings.push(format!("Monthly cashflow stays negative for all {years} years"));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Investment Milestones (first year each threshold is crossed)",
        input,
        warnings,
        elapsed,
        milestones,
    ))
}

fn scan(entries: &[AmortizationYearEntry], financed: Money, equity: Money) -> Milestones {
    let mut m = Milestones::default();

    let first = |slot: &mut Option<u32>, year: u32, hit: bool| {
        if slot.is_none() && hit {
            *slot = Some(year);
        }
    };

    for e in entries {
        let repaid_pct = if financed > Decimal::ZERO {
            e.cumulative_principal / financed * dec!(100)
        } else {
            Decimal::ZERO
        };

        first(&mut m.loan_25_pct_repaid, e.year, repaid_pct >= dec!(25));
        first(&mut m.loan_50_pct_repaid, e.year, repaid_pct >= dec!(50));
        first(&mut m.loan_75_pct_repaid, e.year, repaid_pct >= dec!(75));
        first(
            &mut m.loan_fully_repaid,
            e.year,
            e.remaining_debt <= Decimal::ZERO,
        );
        first(
            &mut m.first_positive_cashflow,
            e.year,
            e.monthly_cashflow > Decimal::ZERO,
        );
        first(
            &mut m.equity_doubled,
            e.year,
            equity > Decimal::ZERO && e.accumulated_equity >= equity * dec!(2),
        );
        first(&mut m.wealth_100k, e.year, e.total_wealth >= dec!(100000));
        first(&mut m.wealth_250k, e.year, e.total_wealth >= dec!(250000));
        first(&mut m.wealth_500k, e.year, e.total_wealth >= dec!(500000));
    }
    m
}
