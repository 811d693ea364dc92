use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::EngineConfig;
use crate::error::ImmoError;
use crate::property::{LoanTerms, PropertyFinancials};
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::ImmoResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Qualitative band of the monthly cashflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CashflowRating {
    /// More than 200 per month
    VeryGood,
    /// Positive
    Good,
    /// Down to -100 per month, nearly self-sustaining
    Fair,
    /// Significant monthly top-up required
    Poor,
}

/// Qualitative band for price factor and gross yield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricRating {
    VeryGood,
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashflowSummary {
    pub financed_amount: Money,
    pub equity: Money,
    /// Financed amount / purchase price, %
    pub financing_ratio_pct: Percent,
    pub monthly_rent: Money,
    /// Interest + amortization per month
    pub monthly_rate: Money,
    /// Service charge share the landlord carries
    pub monthly_non_allocatable: Money,
    pub monthly_cashflow: Money,
    pub annual_cashflow: Money,
    pub gross_yield_pct: Percent,
    pub net_yield_pct: Percent,
    /// Annual cashflow / equity; undefined with full financing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_on_equity_pct: Option<Percent>,
    pub self_sustaining: bool,
    pub cashflow_positive: bool,
    pub rating: CashflowRating,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentMetrics {
    /// Purchase price / annual cold rent (Kaufpreisfaktor)
    pub price_factor: Decimal,
    pub price_factor_rating: MetricRating,
    pub gross_yield_pct: Percent,
    pub gross_yield_rating: MetricRating,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_sqm: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rent_per_sqm: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashflowInput {
    pub financials: PropertyFinancials,
    pub loan: LoanTerms,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashflowAnalysis {
    pub cashflow: CashflowSummary,
    /// Absent when the property has no rent to relate the price to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<InvestmentMetrics>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Monthly cashflow of a financed property at the given loan terms.
///
/// Pure and cheap: this is the cell function of the sensitivity matrix and
/// gets called on every slider movement.
pub fn compute_cashflow(
    financials: &PropertyFinancials,
    loan: &LoanTerms,
    config: &EngineConfig,
) -> ImmoResult<CashflowSummary> {
    financials.validate()?;
    loan.validate(financials)?;

    let price = financials.purchase_price;
    let financed_amount = loan.financed_amount(financials);

    let monthly_rate = financed_amount * loan.total_rate_pct() / dec!(100) / dec!(12);
    let monthly_non_allocatable = non_allocatable(financials, config);

    let monthly_cashflow = financials.monthly_rent - monthly_rate - monthly_non_allocatable;
    let annual_cashflow = monthly_cashflow * dec!(12);

    let gross_yield_pct = financials.annual_rent() / price * dec!(100);
    let net_yield_pct =
        (financials.monthly_rent - monthly_non_allocatable) * dec!(12) / price * dec!(100);

    let return_on_equity_pct = if loan.equity.is_zero() {
        None
    } else {
        // None as well when a near-zero equity makes the ratio unrepresentable
        annual_cashflow
            .checked_div(loan.equity)
            .and_then(|r| r.checked_mul(dec!(100)))
    };

    Ok(CashflowSummary {
        financed_amount,
        equity: loan.equity,
        financing_ratio_pct: financed_amount / price * dec!(100),
        monthly_rent: financials.monthly_rent,
        monthly_rate,
        monthly_non_allocatable,
        monthly_cashflow,
        annual_cashflow,
        gross_yield_pct,
        net_yield_pct,
        return_on_equity_pct,
        self_sustaining: monthly_cashflow >= Decimal::ZERO,
        cashflow_positive: monthly_cashflow > Decimal::ZERO,
        rating: rate_cashflow(monthly_cashflow),
    })
}

/// Purchase price factor and gross yield with their rating bands.
pub fn investment_metrics(financials: &PropertyFinancials) -> ImmoResult<InvestmentMetrics> {
    financials.validate()?;
    let annual_rent = financials.annual_rent();
    if annual_rent <= Decimal::ZERO {
        return Err(ImmoError::DivisionByZero {
            context: "price factor (purchase_price / annual_rent)".into(),
        });
    }

    let price_factor = financials
        .purchase_price
        .checked_div(annual_rent)
        .ok_or_else(|| ImmoError::DivisionByZero {
            context: "price factor (annual_rent too small)".into(),
        })?;
    let gross_yield_pct = annual_rent / financials.purchase_price * dec!(100);

    let price_factor_rating = if price_factor < dec!(20) {
        MetricRating::VeryGood
    } else if price_factor < dec!(25) {
        MetricRating::Good
    } else if price_factor < dec!(30) {
        MetricRating::Fair
    } else {
        MetricRating::Poor
    };

    let gross_yield_rating = if gross_yield_pct >= dec!(5) {
        MetricRating::VeryGood
    } else if gross_yield_pct >= dec!(4) {
        MetricRating::Good
    } else if gross_yield_pct >= dec!(3) {
        MetricRating::Fair
    } else {
        MetricRating::Poor
    };

    // validate() guarantees a present area is positive
    let price_per_sqm = financials
        .living_area_sqm
        .map(|a| financials.purchase_price / a);
    let rent_per_sqm = financials
        .living_area_sqm
        .map(|a| financials.monthly_rent / a);

    Ok(InvestmentMetrics {
        price_factor,
        price_factor_rating,
        gross_yield_pct,
        gross_yield_rating,
        price_per_sqm,
        rent_per_sqm,
    })
}

/// Cashflow plus investment metrics, wrapped with warnings and metadata.
pub fn cashflow_analysis(
    input: &CashflowInput,
    config: &EngineConfig,
) -> ImmoResult<ComputationOutput<CashflowAnalysis>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let cashflow = compute_cashflow(&input.financials, &input.loan, config)?;
    let metrics = if input.financials.monthly_rent > Decimal::ZERO {
        Some(investment_metrics(&input.financials)?)
    } else {
        warnings.push("No rent given — price factor and yield ratings skipped".into());
        None
    };

    collect_warnings(&cashflow, &mut warnings);
    log::debug!(
        "cashflow: financed={} monthly_cashflow={}",
        cashflow.financed_amount,
        cashflow.monthly_cashflow
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Annuity Loan Cashflow (interest + initial amortization)",
        input,
        warnings,
        elapsed,
        CashflowAnalysis { cashflow, metrics },
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Monthly service charge share that cannot be passed on to the tenant.
pub(crate) fn non_allocatable(financials: &PropertyFinancials, config: &EngineConfig) -> Money {
    financials.monthly_service_charge * config.non_allocatable_fraction
}

fn rate_cashflow(monthly_cashflow: Money) -> CashflowRating {
    if monthly_cashflow > dec!(200) {
        CashflowRating::VeryGood
    } else if monthly_cashflow > Decimal::ZERO {
        CashflowRating::Good
    } else if monthly_cashflow >= dec!(-100) {
        CashflowRating::Fair
    } else {
        CashflowRating::Poor
    }
}

fn collect_warnings(cf: &CashflowSummary, warnings: &mut Vec<String>) {
    if cf.financing_ratio_pct >= dec!(100) {
        warnings.push("Full financing (100% LTV) — lender approval not guaranteed".into());
    }
    if !cf.self_sustaining {
        warnings.push(format!(
            "Negative cashflow of {} per month must be topped up",
            cf.monthly_cashflow.round_dp(2)
        ));
    }
    if cf.gross_yield_pct < dec!(3) {
        warnings.push(format!(
            "Gross yield {:.2}% is below 3% — price is high relative to rent",
            cf.gross_yield_pct
        ));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
