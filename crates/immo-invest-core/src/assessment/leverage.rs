use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ImmoError;
use crate::property::{LoanTerms, PropertyFinancials};
use crate::types::Percent;
use crate::ImmoResult;

/// Effect of debt on the return on equity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeverageEffect {
    /// Gross yield of the property, %
    pub object_yield_pct: Percent,
    pub interest_rate_pct: Percent,
    /// Object yield minus interest rate, percentage points
    pub spread_pct: Percent,
    /// Debt / equity
    pub leverage_factor: Decimal,
    /// object yield + spread × leverage factor, %
    pub equity_return_pct: Percent,
    pub positive_leverage: bool,
    /// Interest rate above which debt starts eating into the equity return
    pub break_even_rate_pct: Percent,
}

/// Return on equity under the classic leverage formula
/// `r_E = r_O + (r_O − i) × D / E`.
pub fn leverage_effect(
    financials: &PropertyFinancials,
    loan: &LoanTerms,
) -> ImmoResult<LeverageEffect> {
    financials.validate()?;
    loan.validate(financials)?;
    if loan.equity <= Decimal::ZERO {
        return Err(ImmoError::invalid(
            "equity",
            "Leverage needs equity above 0",
        ));
    }

    let object_yield_pct = financials.annual_rent() / financials.purchase_price * dec!(100);
    let debt = loan.financed_amount(financials);
    let spread_pct = object_yield_pct - loan.interest_rate_pct;

    let too_thin = || {
        ImmoError::invalid(
            "equity",
            "Equity is too small relative to the loan to express the leverage",
        )
    };
    let leverage_factor = debt.checked_div(loan.equity).ok_or_else(too_thin)?;
    let equity_return_pct = spread_pct
        .checked_mul(leverage_factor)
        .and_then(|lift| object_yield_pct.checked_add(lift))
        .ok_or_else(too_thin)?;

    Ok(LeverageEffect {
        object_yield_pct,
        interest_rate_pct: loan.interest_rate_pct,
        spread_pct,
        leverage_factor,
        equity_return_pct,
        positive_leverage: spread_pct > Decimal::ZERO,
        break_even_rate_pct: object_yield_pct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_property() -> PropertyFinancials {
        PropertyFinancials {
            purchase_price: dec!(200000),
            monthly_rent: dec!(1000),
            monthly_service_charge: dec!(200),
            living_area_sqm: None,
            construction_year: None,
        }
    }

    #[test]
    fn test_positive_leverage_lifts_equity_return() {
        // yield 6%, debt 150k on 50k equity, spread 2pp
        let lev = leverage_effect(
            &sample_property(),
            &LoanTerms::new(dec!(50000), dec!(4), dec!(2)),
        )
        .unwrap();
        assert_eq!(lev.object_yield_pct, dec!(6));
        assert_eq!(lev.spread_pct, dec!(2));
        assert_eq!(lev.leverage_factor, dec!(3));
        assert_eq!(lev.equity_return_pct, dec!(12));
        assert!(lev.positive_leverage);
        assert_eq!(lev.break_even_rate_pct, dec!(6));
    }

    #[test]
    fn test_negative_leverage_when_interest_exceeds_yield() {
        let lev = leverage_effect(
            &sample_property(),
            &LoanTerms::new(dec!(100000), dec!(7), dec!(1)),
        )
        .unwrap();
        // 6 + (6 - 7) * 1 = 5
        assert_eq!(lev.equity_return_pct, dec!(5));
        assert!(!lev.positive_leverage);
    }

    #[test]
    fn test_full_equity_has_no_leverage() {
        let lev = leverage_effect(
            &sample_property(),
            &LoanTerms::new(dec!(200000), dec!(4), dec!(2)),
        )
        .unwrap();
        assert_eq!(lev.leverage_factor, Decimal::ZERO);
        assert_eq!(lev.equity_return_pct, lev.object_yield_pct);
    }

    #[test]
    fn test_zero_equity_rejected() {
        let err = leverage_effect(
            &sample_property(),
            &LoanTerms::new(Decimal::ZERO, dec!(4), dec!(2)),
        )
        .unwrap_err();
        assert!(matches!(err, ImmoError::InvalidInput { .. }));
    }
}
