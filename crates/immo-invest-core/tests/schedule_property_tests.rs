use immo_invest_core::config::EngineConfig;
use immo_invest_core::projection::{break_even, cashflow, schedule};
use immo_invest_core::property::{LoanTerms, PropertyFinancials};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn property(price: u32, rent: u32, service_charge: u32) -> PropertyFinancials {
    PropertyFinancials {
        purchase_price: Decimal::from(price),
        monthly_rent: Decimal::from(rent),
        monthly_service_charge: Decimal::from(service_charge),
        living_area_sqm: None,
        construction_year: None,
    }
}

/// Basis points to a percent value: 375 -> 3.75
fn pct(bp: u32) -> Decimal {
    Decimal::new(i64::from(bp), 2)
}

proptest! {
    #[test]
    fn prop_remaining_debt_never_increases(
        price in 50_000u32..2_000_000,
        equity_share in 0u32..=100,
        interest_bp in 0u32..900,
        amort_bp in 0u32..600,
        rent_growth_bp in 0u32..400,
    ) {
        let f = property(price, 900, 250);
        let equity = Decimal::from(price) * Decimal::from(equity_share) / dec!(100);
        let loan = LoanTerms::new(equity, pct(interest_bp), pct(amort_bp));
        let iter = schedule::generate_schedule(
            &f, &loan, 40, pct(rent_growth_bp), dec!(1.5), &EngineConfig::default(),
        ).unwrap();
        let financed = iter.financed_amount();

        let mut previous = financed;
        let mut principal_sum = Decimal::ZERO;
        for entry in iter {
            prop_assert!(entry.remaining_debt <= previous);
            prop_assert!(entry.remaining_debt >= Decimal::ZERO);
            principal_sum += entry.principal_paid;
            previous = entry.remaining_debt;
        }
        prop_assert!((principal_sum + previous - financed).abs() < dec!(0.0001));
    }

    #[test]
    fn prop_break_even_equity_within_price(
        price in 50_000u32..2_000_000,
        rent in 0u32..10_000,
        service_charge in 0u32..1_000,
        interest_bp in 1u32..900,
        amort_bp in 0u32..600,
    ) {
        let f = property(price, rent, service_charge);
        let be = break_even::find_break_even_equity(
            &f, pct(interest_bp), pct(amort_bp), &EngineConfig::default(),
        ).unwrap();
        prop_assert!(be.required_equity >= Decimal::ZERO);
        prop_assert!(be.required_equity <= f.purchase_price);

        if be.status == break_even::BreakEvenStatus::Reachable {
            let loan = LoanTerms::new(be.required_equity, pct(interest_bp), pct(amort_bp));
            let cf = cashflow::compute_cashflow(&f, &loan, &EngineConfig::default()).unwrap();
            prop_assert!(cf.monthly_cashflow.abs() < Decimal::ONE);
        }
    }
}
