use immo_invest_core::config::{EngineConfig, NonAmortizingPolicy};
use immo_invest_core::projection::{break_even, cashflow, schedule, sensitivity};
use immo_invest_core::property::{LoanTerms, PropertyFinancials};
use immo_invest_core::ImmoError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn reference_property() -> PropertyFinancials {
    PropertyFinancials {
        purchase_price: dec!(300000),
        monthly_rent: dec!(950),
        monthly_service_charge: dec!(280),
        living_area_sqm: None,
        construction_year: None,
    }
}

// ===========================================================================
// Reference scenarios
// ===========================================================================

#[test]
fn test_reference_full_financing_cashflow() {
    // price 300000, rent 950, service charge 280, equity 0, 3.8% + 1.5%
    let loan = LoanTerms::new(dec!(0), dec!(3.8), dec!(1.5));
    let cf = cashflow::compute_cashflow(&reference_property(), &loan, &EngineConfig::default())
        .unwrap();
    assert_eq!(cf.financed_amount, dec!(300000));
    assert_eq!(cf.monthly_rate, dec!(1325));
    assert_eq!(cf.monthly_non_allocatable, dec!(84));
    assert_eq!(cf.monthly_cashflow, dec!(-459));
    assert!(!cf.self_sustaining);
    assert_eq!(cf.gross_yield_pct, dec!(3.8));
}

#[test]
fn test_reference_break_even_equity() {
    // (950 - 84) * 12 / 0.053 = 196,075.47 financed, so 103,924.53 equity
    let be = break_even::find_break_even_equity(
        &reference_property(),
        dec!(3.8),
        dec!(1.5),
        &EngineConfig::default(),
    )
    .unwrap();
    assert!(
        (be.required_equity - dec!(103924.53)).abs() < dec!(0.01),
        "Expected ~103,924.53, got {}",
        be.required_equity
    );
}

#[test]
fn test_break_even_round_trip_within_one_unit() {
    let cfg = EngineConfig::default();
    for (rate, amort) in [
        (dec!(3.8), dec!(1.5)),
        (dec!(2.5), dec!(2.0)),
        (dec!(5.0), dec!(1.0)),
    ] {
        let be =
            break_even::find_break_even_equity(&reference_property(), rate, amort, &cfg).unwrap();
        let loan = LoanTerms::new(be.required_equity, rate, amort);
        let cf = cashflow::compute_cashflow(&reference_property(), &loan, &cfg).unwrap();
        assert!(
            cf.monthly_cashflow.abs() < Decimal::ONE,
            "rate {rate}/{amort}: cashflow {}",
            cf.monthly_cashflow
        );
    }
}

// ===========================================================================
// Cross-module consistency
// ===========================================================================

#[test]
fn test_every_matrix_cell_matches_single_point() {
    let cfg = EngineConfig::default();
    let rates = sensitivity::default_rate_candidates(dec!(3.8), &cfg);
    let equities = sensitivity::default_equity_candidates(dec!(300000), &cfg);
    let m = sensitivity::build_matrix(
        &reference_property(),
        dec!(1.5),
        &rates,
        &equities,
        None,
        &cfg,
    )
    .unwrap();

    for (i, rate) in rates.iter().enumerate() {
        for (j, equity) in equities.iter().enumerate() {
            let single = cashflow::compute_cashflow(
                &reference_property(),
                &LoanTerms::new(*equity, *rate, dec!(1.5)),
                &cfg,
            )
            .unwrap();
            assert_eq!(m.cells[i][j].monthly_cashflow, single.monthly_cashflow);
            assert_eq!(m.cells[i][j].self_sustaining, single.self_sustaining);
        }
    }
}

#[test]
fn test_schedule_first_year_equals_cashflow() {
    let cfg = EngineConfig::default();
    let loan = LoanTerms::new(dec!(45000), dec!(3.8), dec!(1.5));
    let first = schedule::generate_schedule(
        &reference_property(),
        &loan,
        30,
        dec!(1.5),
        dec!(1.5),
        &cfg,
    )
    .unwrap()
    .next()
    .unwrap();
    let cf = cashflow::compute_cashflow(&reference_property(), &loan, &cfg).unwrap();
    assert_eq!(first.monthly_cashflow, cf.monthly_cashflow);
}

#[test]
fn test_schedule_clone_replays_identically() {
    let iter = schedule::generate_schedule(
        &reference_property(),
        &LoanTerms::new(dec!(60000), dec!(3.8), dec!(1.5)),
        30,
        dec!(1.5),
        dec!(1.5),
        &EngineConfig::default(),
    )
    .unwrap();
    let before = iter.clone();
    let first: Vec<_> = iter.collect();
    let second: Vec<_> = before.collect();
    assert_eq!(first, second);
}

#[test]
fn test_non_amortizing_policy_switch() {
    let loan = LoanTerms::new(dec!(60000), dec!(3.8), dec!(0));
    let flagged = schedule::build_schedule(
        &reference_property(),
        &loan,
        10,
        dec!(0),
        dec!(0),
        &EngineConfig::default(),
    )
    .unwrap();
    assert!(flagged.years.iter().all(|e| e.non_amortizing));
    assert!(flagged
        .years
        .iter()
        .all(|e| e.remaining_debt == dec!(240000)));

    let strict = EngineConfig {
        non_amortizing_policy: NonAmortizingPolicy::Reject,
        ..EngineConfig::default()
    };
    let err = schedule::build_schedule(&reference_property(), &loan, 10, dec!(0), dec!(0), &strict)
        .unwrap_err();
    assert!(matches!(err, ImmoError::NonAmortizingLoan { .. }));
}

#[test]
fn test_zero_price_is_typed_error() {
    let mut p = reference_property();
    p.purchase_price = Decimal::ZERO;
    let loan = LoanTerms::new(dec!(0), dec!(3.8), dec!(1.5));
    assert!(matches!(
        cashflow::compute_cashflow(&p, &loan, &EngineConfig::default()),
        Err(ImmoError::InvalidInput { .. })
    ));
}
