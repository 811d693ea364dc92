use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::EngineConfig;
use crate::error::ImmoError;
use crate::property::{LoanTerms, PropertyFinancials};
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::ImmoResult;

use super::schedule::{build_schedule, check_horizon, growth_factor};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyOutcome {
    /// Property value minus remaining debt at the end of the horizon
    pub final_wealth: Money,
    pub equity_invested: Money,
    /// Negative first-year cashflow the owner has to add each month
    pub monthly_top_up: Money,
    /// Equity plus all monthly top-ups
    pub total_invested: Money,
    /// Final wealth / equity; None without equity
    pub wealth_multiple: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtfOutcome {
    pub final_wealth: Money,
    pub assumed_return_pct: Percent,
    pub monthly_savings: Money,
    pub total_invested: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentComparison {
    pub years: u32,
    pub property: PropertyOutcome,
    /// ETF bought with the equity only
    pub etf_equity_only: EtfOutcome,
    /// ETF bought with the equity plus the property's monthly top-up
    pub etf_with_savings: EtfOutcome,
    pub property_vs_etf_equity_only: Money,
    pub property_vs_etf_with_savings: Money,
    pub property_outperforms: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonInput {
    pub financials: PropertyFinancials,
    pub loan: LoanTerms,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years: Option<u32>,
}

/// Property wealth after `years` versus an ETF funded with the same money.
pub fn compare_with_etf(
    financials: &PropertyFinancials,
    loan: &LoanTerms,
    years: u32,
    config: &EngineConfig,
) -> ImmoResult<InvestmentComparison> {
    check_horizon(years, config)?;
    if config.etf_return_pct <= dec!(-100) {
        return Err(ImmoError::ConfigError(
            "etf_return_pct must be above -100".into(),
        ));
    }
    let schedule = build_schedule(
        financials,
        loan,
        years,
        config.default_rent_growth_pct,
        config.default_value_growth_pct,
        config,
    )?;

    let property_wealth = schedule.summary.wealth_end;
    let first_year_cashflow = schedule
        .years
        .first()
        .map(|e| e.monthly_cashflow)
        .unwrap_or(Decimal::ZERO);
    let top_up = if first_year_cashflow < Decimal::ZERO {
        -first_year_cashflow
    } else {
        Decimal::ZERO
    };

    let months = Decimal::from(years) * dec!(12);
    let total_invested = loan.equity + top_up * months;

    let annual_rate = config.etf_return_pct / dec!(100);
    let growth = growth_factor(annual_rate, years).ok_or_else(|| etf_overflow(years))?;
    let etf_equity_only = loan
        .equity
        .checked_mul(growth)
        .ok_or_else(|| etf_overflow(years))?;
    let etf_with_savings = top_up
        .checked_mul(annuity_factor(annual_rate, growth, months))
        .and_then(|savings| savings.checked_add(etf_equity_only))
        .ok_or_else(|| etf_overflow(years))?;

    let wealth_multiple = if loan.equity > Decimal::ZERO {
        Some(property_wealth / loan.equity)
    } else {
        None
    };

    Ok(InvestmentComparison {
        years,
        property: PropertyOutcome {
            final_wealth: property_wealth,
            equity_invested: loan.equity,
            monthly_top_up: top_up,
            total_invested,
            wealth_multiple,
        },
        etf_equity_only: EtfOutcome {
            final_wealth: etf_equity_only,
            assumed_return_pct: config.etf_return_pct,
            monthly_savings: Decimal::ZERO,
            total_invested: loan.equity,
        },
        etf_with_savings: EtfOutcome {
            final_wealth: etf_with_savings,
            assumed_return_pct: config.etf_return_pct,
            monthly_savings: top_up,
            total_invested,
        },
        property_vs_etf_equity_only: property_wealth - etf_equity_only,
        property_vs_etf_with_savings: property_wealth - etf_with_savings,
        property_outperforms: property_wealth > etf_with_savings,
    })
}

pub fn investment_comparison(
    input: &ComparisonInput,
    config: &EngineConfig,
) -> ImmoResult<ComputationOutput<InvestmentComparison>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let years = input.years.unwrap_or(config.schedule_years);

    let comparison = compare_with_etf(&input.financials, &input.loan, years, config)?;
    if !comparison.property_outperforms {
        warnings.push(format!(
            "An ETF at {}% p.a. ends {:.0} ahead of the property",
            config.etf_return_pct, -comparison.property_vs_etf_with_savings
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Property vs ETF (end-of-horizon wealth, monthly compounding of savings)",
        input,
        warnings,
        elapsed,
        comparison,
    ))
}

fn etf_overflow(years: u32) -> ImmoError {
    ImmoError::ConfigError(format!(
        "etf_return_pct compounded over {years} years exceeds the representable range"
    ))
}

/// Future value of 1 paid in every month, with the annual rate compounded
/// monthly at the equivalent rate `(1 + r)^(1/12) - 1`.
fn annuity_factor(annual_rate: Decimal, annual_growth: Decimal, months: Decimal) -> Decimal {
    if annual_rate.is_zero() {
        return months;
    }
    let monthly = (Decimal::ONE + annual_rate).powd(Decimal::ONE / dec!(12)) - Decimal::ONE;
    if monthly.is_zero() {
        return months;
    }
    (annual_growth - Decimal::ONE) / monthly
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_property() -> PropertyFinancials {
        PropertyFinancials {
            purchase_price: dec!(300000),
            monthly_rent: dec!(950),
            monthly_service_charge: dec!(280),
            living_area_sqm: None,
            construction_year: None,
        }
    }

    #[test]
    fn test_horizon_beyond_maximum_rejected() {
        let loan = LoanTerms::new(dec!(60000), dec!(3.8), dec!(1.5));
        let err = compare_with_etf(&sample_property(), &loan, 5000, &EngineConfig::default())
            .unwrap_err();
        assert!(matches!(err, ImmoError::InvalidInput { ref field, .. } if field == "years"));
    }

    #[test]
    fn test_extreme_etf_return_is_an_error() {
        let cfg = EngineConfig {
            etf_return_pct: dec!(100000),
            ..EngineConfig::default()
        };
        let loan = LoanTerms::new(dec!(60000), dec!(3.8), dec!(1.5));
        let result = std::panic::catch_unwind(|| {
            compare_with_etf(&sample_property(), &loan, 30, &cfg).map(|_| ())
        });
        assert!(matches!(result, Ok(Err(ImmoError::ConfigError(_)))));
    }

    #[test]
    fn test_etf_equity_only() {
        let loan = LoanTerms::new(dec!(60000), dec!(3.8), dec!(1.5));
        let c = compare_with_etf(&sample_property(), &loan, 30, &EngineConfig::default()).unwrap();
        // 60000 * 1.07^30 = 456,735.30
        let etf = c.etf_equity_only.final_wealth;
        assert!((etf - dec!(456735.30)).abs() < dec!(0.01), "got {etf}");
        assert_eq!(c.etf_equity_only.total_invested, dec!(60000));
    }

    #[test]
    fn test_negative_cashflow_becomes_savings_rate() {
        let loan = LoanTerms::new(dec!(60000), dec!(3.8), dec!(1.5));
        let c = compare_with_etf(&sample_property(), &loan, 30, &EngineConfig::default()).unwrap();
        // 950 - 1060 - 84
        assert_eq!(c.property.monthly_top_up, dec!(194));
        assert_eq!(c.property.total_invested, dec!(60000) + dec!(194) * dec!(360));
        assert!(c.etf_with_savings.final_wealth > c.etf_equity_only.final_wealth);
        // 194 per month at ~0.565% per month over 360 months adds ~226,900
        let savings_part = c.etf_with_savings.final_wealth - c.etf_equity_only.final_wealth;
        assert!(
            savings_part > dec!(225000) && savings_part < dec!(229000),
            "got {savings_part}"
        );
    }

    #[test]
    fn test_positive_cashflow_means_no_savings() {
        let loan = LoanTerms::new(dec!(150000), dec!(3.8), dec!(1.5));
        let c = compare_with_etf(&sample_property(), &loan, 30, &EngineConfig::default()).unwrap();
        assert_eq!(c.property.monthly_top_up, Decimal::ZERO);
        assert_eq!(
            c.etf_with_savings.final_wealth,
            c.etf_equity_only.final_wealth
        );
    }

    #[test]
    fn test_zero_equity_has_no_multiple() {
        let loan = LoanTerms::new(dec!(0), dec!(3.8), dec!(1.5));
        let c = compare_with_etf(&sample_property(), &loan, 30, &EngineConfig::default()).unwrap();
        assert_eq!(c.property.wealth_multiple, None);
        assert_eq!(c.etf_equity_only.final_wealth, Decimal::ZERO);
    }

    #[test]
    fn test_zero_return_annuity_is_plain_sum() {
        assert_eq!(annuity_factor(Decimal::ZERO, Decimal::ONE, dec!(360)), dec!(360));
    }

    #[test]
    fn test_envelope_warns_when_etf_wins() {
        let input = ComparisonInput {
            financials: sample_property(),
            loan: LoanTerms::new(dec!(60000), dec!(3.8), dec!(1.5)),
            years: None,
        };
        let out = investment_comparison(&input, &EngineConfig::default()).unwrap();
        assert_eq!(out.result.years, 30);
        assert_eq!(
            out.result.property_outperforms,
            out.warnings.is_empty()
        );
    }
}
