use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::EngineConfig;
use crate::error::ImmoError;
use crate::property::PropertyFinancials;
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::ImmoResult;

use super::cashflow::non_allocatable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakEvenStatus {
    /// Cashflow is already non-negative with full financing
    PositiveWithoutEquity,
    /// Some equity between 0 and the purchase price closes the gap
    Reachable,
    /// Even a debt-free purchase leaves a negative cashflow
    RequiresFullEquity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakEvenResult {
    /// Minimal equity for a monthly cashflow of zero
    pub required_equity: Money,
    /// Required equity / purchase price, %
    pub equity_ratio_pct: Percent,
    /// Largest loan the rent can carry
    pub max_financed_amount: Money,
    /// Rent after non-allocatable costs, per year
    pub annual_amount_for_debt_service: Money,
    pub status: BreakEvenStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakEvenInput {
    pub financials: PropertyFinancials,
    pub interest_rate_pct: Percent,
    pub amortization_rate_pct: Percent,
    /// Equity the investor currently plans with, for the gap figure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_equity: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakEvenAnalysis {
    pub break_even: BreakEvenResult,
    /// Required minus current equity; negative means headroom
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equity_gap: Option<Money>,
}

/// Minimal equity for which the monthly cashflow is not negative.
///
/// Closed-form inversion of the cashflow formula:
/// `financed × (interest + amortization) / 100 / 12 = rent − non_allocatable`.
pub fn find_break_even_equity(
    financials: &PropertyFinancials,
    interest_rate_pct: Percent,
    amortization_rate_pct: Percent,
    config: &EngineConfig,
) -> ImmoResult<BreakEvenResult> {
    financials.validate()?;
    if interest_rate_pct < Decimal::ZERO || amortization_rate_pct < Decimal::ZERO {
        return Err(ImmoError::invalid(
            "interest_rate_pct",
            "Rates cannot be negative",
        ));
    }
    let total_rate = interest_rate_pct + amortization_rate_pct;
    if total_rate.is_zero() {
        return Err(ImmoError::invalid(
            "interest_rate_pct",
            "Interest plus amortization must be positive to carry a loan",
        ));
    }

    let price = financials.purchase_price;
    let available = (financials.monthly_rent - non_allocatable(financials, config)) * dec!(12);
    // A vanishing rate carries any loan; cap at the price instead of overflowing.
    let max_financed = (available * dec!(100))
        .checked_div(total_rate)
        .unwrap_or(price)
        .max(Decimal::ZERO);

    let (required_equity, status) = if available < Decimal::ZERO {
        (price, BreakEvenStatus::RequiresFullEquity)
    } else if max_financed >= price {
        (Decimal::ZERO, BreakEvenStatus::PositiveWithoutEquity)
    } else {
        (price - max_financed, BreakEvenStatus::Reachable)
    };

    Ok(BreakEvenResult {
        required_equity,
        equity_ratio_pct: required_equity / price * dec!(100),
        max_financed_amount: max_financed.min(price),
        annual_amount_for_debt_service: available,
        status,
    })
}

/// Break-even equity wrapped with warnings and metadata.
pub fn break_even_analysis(
    input: &BreakEvenInput,
    config: &EngineConfig,
) -> ImmoResult<ComputationOutput<BreakEvenAnalysis>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let break_even = find_break_even_equity(
        &input.financials,
        input.interest_rate_pct,
        input.amortization_rate_pct,
        config,
    )?;

    match break_even.status {
        BreakEvenStatus::PositiveWithoutEquity => {
            log::debug!("break-even: positive cashflow without equity");
        }
        BreakEvenStatus::RequiresFullEquity => {
            warnings.push(
                "Non-allocatable costs exceed the rent — cashflow stays negative even without a loan"
                    .into(),
            );
        }
        BreakEvenStatus::Reachable => {
            if break_even.equity_ratio_pct > dec!(50) {
                warnings.push(format!(
                    "Break-even requires {:.1}% equity — rent is low relative to price",
                    break_even.equity_ratio_pct
                ));
            }
        }
    }

    let equity_gap = input
        .current_equity
        .map(|current| break_even.required_equity - current);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Break-Even Equity (closed-form cashflow inversion)",
        input,
        warnings,
        elapsed,
        BreakEvenAnalysis {
            break_even,
            equity_gap,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::LoanTerms;
    use crate::projection::cashflow::compute_cashflow;
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
    fn test_reference_break_even() {
        let be = find_break_even_equity(
            &sample_property(),
            dec!(3.8),
            dec!(1.5),
            &EngineConfig::default(),
        )
        .unwrap();
        // (950 - 84) * 12 = 10392; 10392 * 100 / 5.3 = 196075.47...
        assert_eq!(be.annual_amount_for_debt_service, dec!(10392));
        assert!((be.max_financed_amount - dec!(196075.4717)).abs() < dec!(0.001));
        assert!((be.required_equity - dec!(103924.5283)).abs() < dec!(0.001));
        assert_eq!(be.status, BreakEvenStatus::Reachable);
    }

    #[test]
    fn test_round_trip_gives_zero_cashflow() {
        let cfg = EngineConfig::default();
        let be = find_break_even_equity(&sample_property(), dec!(3.8), dec!(1.5), &cfg).unwrap();
        let loan = LoanTerms::new(be.required_equity, dec!(3.8), dec!(1.5));
        let cf = compute_cashflow(&sample_property(), &loan, &cfg).unwrap();
        assert!(
            cf.monthly_cashflow.abs() < Decimal::ONE,
            "expected ~0, got {}",
            cf.monthly_cashflow
        );
    }

    #[test]
    fn test_positive_without_equity() {
        let mut p = sample_property();
        p.monthly_rent = dec!(1500);
        let be = find_break_even_equity(&p, dec!(3.8), dec!(1.5), &EngineConfig::default())
            .unwrap();
        assert_eq!(be.required_equity, Decimal::ZERO);
        assert_eq!(be.status, BreakEvenStatus::PositiveWithoutEquity);
        assert_eq!(be.max_financed_amount, dec!(300000));
    }

    #[test]
    fn test_requires_full_equity() {
        let mut p = sample_property();
        p.monthly_rent = dec!(50);
        // 50 - 84 < 0
        let be = find_break_even_equity(&p, dec!(3.8), dec!(1.5), &EngineConfig::default())
            .unwrap();
        assert_eq!(be.status, BreakEvenStatus::RequiresFullEquity);
        assert_eq!(be.required_equity, dec!(300000));
        assert_eq!(be.max_financed_amount, Decimal::ZERO);
        assert_eq!(be.equity_ratio_pct, dec!(100));
    }

    #[test]
    fn test_zero_total_rate_rejected() {
        let err = find_break_even_equity(
            &sample_property(),
            Decimal::ZERO,
            Decimal::ZERO,
            &EngineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ImmoError::InvalidInput { .. }));
    }

    #[test]
    fn test_equity_gap_and_warning() {
        let input = BreakEvenInput {
            financials: sample_property(),
            interest_rate_pct: dec!(3.8),
            amortization_rate_pct: dec!(1.5),
            current_equity: Some(dec!(60000)),
        };
        let out = break_even_analysis(&input, &EngineConfig::default()).unwrap();
        let gap = out.result.equity_gap.unwrap();
        assert!((gap - dec!(43924.5283)).abs() < dec!(0.001));
        // 34.6% equity: no high-equity warning
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_vanishing_rate_needs_no_equity() {
        let be = find_break_even_equity(
            &sample_property(),
            dec!(0.0000000000000000000000001),
            Decimal::ZERO,
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(be.status, BreakEvenStatus::PositiveWithoutEquity);
        assert_eq!(be.required_equity, Decimal::ZERO);
        assert_eq!(be.max_financed_amount, dec!(300000));
    }
}
