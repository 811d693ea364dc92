use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::{EngineConfig, NonAmortizingPolicy};
use crate::error::ImmoError;
use crate::property::{LoanTerms, PropertyFinancials};
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::ImmoResult;

use super::cashflow::non_allocatable;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One year of the amortization schedule (Tilgungsplan).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationYearEntry {
    /// 1-based year index
    pub year: u32,
    /// Debt outstanding at the end of the year
    pub remaining_debt: Money,
    pub interest_paid: Money,
    pub principal_paid: Money,
    pub cumulative_principal: Money,
    /// Initial equity plus all principal repaid so far
    pub accumulated_equity: Money,
    /// Cold rent charged during this year
    pub monthly_rent: Money,
    /// Property value at the end of the year
    pub property_value: Money,
    /// Property value minus remaining debt
    pub total_wealth: Money,
    pub monthly_cashflow: Money,
    pub annual_cashflow: Money,
    /// Payment does not cover interest; debt is held constant
    pub non_amortizing: bool,
}

/// Fixed parameters of a schedule run.
#[derive(Debug, Clone, PartialEq)]
struct ScheduleParams {
    years: u32,
    financed_amount: Money,
    initial_equity: Money,
    purchase_price: Money,
    monthly_rent: Money,
    monthly_non_allocatable: Money,
    interest_rate: Decimal,
    annual_payment: Money,
    rent_growth: Decimal,
    value_growth: Decimal,
    non_amortizing: bool,
}

/// Lazy year-by-year schedule.
///
/// Each iterator owns its own state; clone it to replay from the current
/// position or call [`ScheduleIter::restart`] to start again at year 1.
#[derive(Debug, Clone)]
pub struct ScheduleIter {
    params: ScheduleParams,
    year: u32,
    remaining_debt: Money,
    cumulative_principal: Money,
    monthly_rent: Money,
    property_value: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
    pub financials: PropertyFinancials,
    pub loan: LoanTerms,
    /// Horizon in years (default from config, typically 30)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rent_growth_pct: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_growth_pct: Option<Percent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub financed_amount: Money,
    pub annual_payment: Money,
    pub monthly_payment: Money,
    pub total_interest: Money,
    pub total_principal: Money,
    /// Financed amount plus all interest paid within the horizon
    pub total_cost: Money,
    pub remaining_debt_end: Money,
    pub property_value_end: Money,
    pub wealth_end: Money,
    pub annual_cashflow_year_1: Money,
    pub annual_cashflow_final_year: Money,
    /// Year in which the debt reached zero, if within the horizon
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_off_in_years: Option<u32>,
    pub non_amortizing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub years: Vec<AmortizationYearEntry>,
    pub summary: ScheduleSummary,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build a lazy amortization schedule over `years` years.
///
/// Interest is charged annually on the debt outstanding at the start of the
/// year; the annual payment is fixed at `financed × (interest + amortization)`.
/// Principal is capped at the outstanding debt, so the final payment may be
/// smaller and later years carry no debt service.
pub fn generate_schedule(
    financials: &PropertyFinancials,
    loan: &LoanTerms,
    years: u32,
    rent_growth_pct: Percent,
    value_growth_pct: Percent,
    config: &EngineConfig,
) -> ImmoResult<ScheduleIter> {
    financials.validate()?;
    loan.validate(financials)?;
    check_horizon(years, config)?;
    if rent_growth_pct <= dec!(-100) || value_growth_pct <= dec!(-100) {
        return Err(ImmoError::invalid(
            "growth_pct",
            "Growth rates must be above -100%",
        ));
    }
    let rent_growth = rent_growth_pct / dec!(100);
    let value_growth = value_growth_pct / dec!(100);

    // Final-year rent and value (and the sum of all rents) must stay representable.
    let final_value = growth_factor(value_growth, years)
        .and_then(|g| financials.purchase_price.checked_mul(g));
    let total_rent = growth_factor(rent_growth, years)
        .and_then(|g| financials.annual_rent().checked_mul(g))
        .and_then(|r| r.checked_mul(Decimal::from(years)));
    if final_value.is_none() || total_rent.is_none() {
        return Err(ImmoError::invalid(
            "growth_pct",
            format!("Growth compounded over {years} years exceeds the representable range"),
        ));
    }

    let financed_amount = loan.financed_amount(financials);
    let interest_rate = loan.interest_rate_pct / dec!(100);
    let annual_payment = financed_amount * loan.total_rate_pct() / dec!(100);
    let first_year_interest = financed_amount * interest_rate;

    let non_amortizing =
        financed_amount > Decimal::ZERO && annual_payment <= first_year_interest;
    if non_amortizing {
        match config.non_amortizing_policy {
            NonAmortizingPolicy::Reject => {
                return Err(ImmoError::NonAmortizingLoan {
                    annual_payment,
                    first_year_interest,
                });
            }
            NonAmortizingPolicy::Flag => {
                log::warn!(
                    "non-amortizing loan: payment {annual_payment} vs interest {first_year_interest}"
                );
            }
        }
    }

    let params = ScheduleParams {
        years,
        financed_amount,
        initial_equity: loan.equity,
        purchase_price: financials.purchase_price,
        monthly_rent: financials.monthly_rent,
        monthly_non_allocatable: non_allocatable(financials, config),
        interest_rate,
        annual_payment,
        rent_growth,
        value_growth,
        non_amortizing,
    };
    Ok(ScheduleIter::start(params))
}

/// Full schedule with summary, wrapped with warnings and metadata.
pub fn amortization_schedule(
    input: &ScheduleInput,
    config: &EngineConfig,
) -> ImmoResult<ComputationOutput<AmortizationSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let years = input.years.unwrap_or(config.schedule_years);
    let rent_growth = input.rent_growth_pct.unwrap_or(config.default_rent_growth_pct);
    let value_growth = input.value_growth_pct.unwrap_or(config.default_value_growth_pct);

    let schedule = build_schedule(
        &input.financials,
        &input.loan,
        years,
        rent_growth,
        value_growth,
        config,
    )?;

    if schedule.summary.non_amortizing {
        warnings.push(
            "Non-amortizing loan: payment only covers interest, debt never decreases".into(),
        );
    } else if schedule.summary.paid_off_in_years.is_none() {
        warnings.push(format!(
            "Loan not repaid within {years} years — remaining debt {}",
            schedule.summary.remaining_debt_end.round_dp(2)
        ));
    }
    if rent_growth < Decimal::ZERO || value_growth < Decimal::ZERO {
        warnings.push("Negative growth assumption applied".into());
    }

    log::debug!(
        "schedule: {} years, total interest {}",
        schedule.years.len(),
        schedule.summary.total_interest
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Annuity Loan Amortization Schedule (annual compounding)",
        &serde_json::json!({
            "financials": input.financials,
            "loan": input.loan,
            "years": years,
            "rent_growth_pct": rent_growth,
            "value_growth_pct": value_growth,
        }),
        warnings,
        elapsed,
        schedule,
    ))
}

/// Collect a schedule and its summary. Shared by the scenario and milestone
/// analyses.
pub fn build_schedule(
    financials: &PropertyFinancials,
    loan: &LoanTerms,
    years: u32,
    rent_growth_pct: Percent,
    value_growth_pct: Percent,
    config: &EngineConfig,
) -> ImmoResult<AmortizationSchedule> {
    let iter = generate_schedule(
        financials,
        loan,
        years,
        rent_growth_pct,
        value_growth_pct,
        config,
    )?;
    let financed_amount = iter.params.financed_amount;
    let annual_payment = iter.params.annual_payment;
    let non_amortizing = iter.params.non_amortizing;

    let entries: Vec<AmortizationYearEntry> = iter.collect();
    let summary = summarize(financed_amount, annual_payment, non_amortizing, &entries);
    Ok(AmortizationSchedule {
        years: entries,
        summary,
    })
}

/// Rejects horizons of 0 years or beyond `config.max_horizon_years`.
pub(crate) fn check_horizon(years: u32, config: &EngineConfig) -> ImmoResult<()> {
    if years == 0 {
        return Err(ImmoError::invalid("years", "Horizon must be at least 1 year"));
    }
    if years > config.max_horizon_years {
        return Err(ImmoError::invalid(
            "years",
            format!(
                "Horizon of {years} years exceeds the maximum of {}",
                config.max_horizon_years
            ),
        ));
    }
    Ok(())
}

/// `(1 + rate)^years`, or None when the power overflows.
pub(crate) fn growth_factor(rate: Decimal, years: u32) -> Option<Decimal> {
    let factor = Decimal::ONE + rate;
    (0..years).try_fold(Decimal::ONE, |acc, _| acc.checked_mul(factor))
}

// ---------------------------------------------------------------------------
// Iterator
// ---------------------------------------------------------------------------

impl ScheduleIter {
    fn start(params: ScheduleParams) -> Self {
        Self {
            year: 0,
            remaining_debt: params.financed_amount,
            cumulative_principal: Decimal::ZERO,
            monthly_rent: params.monthly_rent,
            property_value: params.purchase_price,
            params,
        }
    }

    /// A fresh iterator positioned before year 1.
    pub fn restart(&self) -> Self {
        Self::start(self.params.clone())
    }

    pub fn financed_amount(&self) -> Money {
        self.params.financed_amount
    }

    pub fn annual_payment(&self) -> Money {
        self.params.annual_payment
    }

    pub fn is_non_amortizing(&self) -> bool {
        self.params.non_amortizing
    }
}

impl Iterator for ScheduleIter {
    type Item = AmortizationYearEntry;

    fn next(&mut self) -> Option<Self::Item> {
        if self.year >= self.params.years {
            return None;
        }
        self.year += 1;
        let p = &self.params;

        let interest = self.remaining_debt * p.interest_rate;
        let principal = (p.annual_payment - interest)
            .max(Decimal::ZERO)
            .min(self.remaining_debt);
        self.remaining_debt -= principal;
        self.cumulative_principal += principal;

        let debt_service = interest + principal;
        let annual_cashflow =
            (self.monthly_rent - p.monthly_non_allocatable) * dec!(12) - debt_service;

        // Value is reported at year end; rent applies to the year itself.
        // Bounded by the overflow check in generate_schedule
        self.property_value = self.property_value.saturating_mul(Decimal::ONE + p.value_growth);

        let entry = AmortizationYearEntry {
            year: self.year,
            remaining_debt: self.remaining_debt,
            interest_paid: interest,
            principal_paid: principal,
            cumulative_principal: self.cumulative_principal,
            accumulated_equity: p.initial_equity + self.cumulative_principal,
            monthly_rent: self.monthly_rent,
            property_value: self.property_value,
            total_wealth: self.property_value - self.remaining_debt,
            monthly_cashflow: annual_cashflow / dec!(12),
            annual_cashflow,
            non_amortizing: p.non_amortizing,
        };

        self.monthly_rent = self.monthly_rent.saturating_mul(Decimal::ONE + p.rent_growth);
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.params.years - self.year) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for ScheduleIter {}

fn summarize(
    financed_amount: Money,
    annual_payment: Money,
    non_amortizing: bool,
    entries: &[AmortizationYearEntry],
) -> ScheduleSummary {
    let total_interest: Money = entries.iter().map(|e| e.interest_paid).sum();
    let total_principal: Money = entries.iter().map(|e| e.principal_paid).sum();
    let first = entries.first();
    let last = entries.last();

    let paid_off_in_years = if financed_amount.is_zero() {
        Some(0)
    } else {
        entries
            .iter()
            .find(|e| e.remaining_debt.is_zero())
            .map(|e| e.year)
    };

    ScheduleSummary {
        financed_amount,
        annual_payment,
        monthly_payment: annual_payment / dec!(12),
        total_interest,
        total_principal,
        total_cost: financed_amount + total_interest,
        remaining_debt_end: last.map_or(financed_amount, |e| e.remaining_debt),
        property_value_end: last.map_or(Decimal::ZERO, |e| e.property_value),
        wealth_end: last.map_or(Decimal::ZERO, |e| e.total_wealth),
        annual_cashflow_year_1: first.map_or(Decimal::ZERO, |e| e.annual_cashflow),
        annual_cashflow_final_year: last.map_or(Decimal::ZERO, |e| e.annual_cashflow),
        paid_off_in_years,
        non_amortizing,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
