use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::EngineConfig;
use crate::error::ImmoError;
use crate::property::PropertyFinancials;
use crate::types::{with_metadata, ComputationOutput, Fraction, Money, Percent};
use crate::ImmoResult;

use crate::projection::cashflow::non_allocatable;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FairPriceMethod {
    /// Annual rent / target gross yield
    TargetYield,
    /// Annual rent × target price factor
    TargetFactor,
    /// Comparable €/m² × living area
    ComparablePrice,
    /// Largest loan at zero cashflow, net of buying costs
    CashflowNeutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceVerdict {
    Bargain,
    Fair,
    SlightlyOverpriced,
    Overpriced,
    HeavilyOverpriced,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodPrice {
    pub method: FairPriceMethod,
    pub price: Money,
    /// Weight actually applied after dropping unavailable methods
    pub weight: Fraction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FairPriceInput {
    pub financials: PropertyFinancials,
    /// Market price per m² of comparable properties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparable_price_per_sqm: Option<Money>,
    pub interest_rate_pct: Percent,
    pub amortization_rate_pct: Percent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_yield_pct: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_factor: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FairPriceResult {
    pub methods: Vec<MethodPrice>,
    pub fair_price: Money,
    pub asking_price: Money,
    /// Asking minus fair price
    pub difference: Money,
    /// (asking / fair − 1) × 100
    pub deviation_pct: Percent,
    pub verdict: PriceVerdict,
    pub negotiation_target: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Weighted fair price from up to four valuation methods.
///
/// The comparable-price method needs both a living area and a comparable
/// €/m²; without them its weight is spread over the other methods.
pub fn estimate_fair_price(
    input: &FairPriceInput,
    config: &EngineConfig,
) -> ImmoResult<FairPriceResult> {
    let f = &input.financials;
    f.validate()?;
    let annual_rent = f.annual_rent();
    if annual_rent <= Decimal::ZERO {
        return Err(ImmoError::DivisionByZero {
            context: "fair price needs a positive rent".into(),
        });
    }

    let target_yield = input
        .target_yield_pct
        .unwrap_or(config.fair_price_target_yield_pct);
    if target_yield <= Decimal::ZERO {
        return Err(ImmoError::invalid(
            "target_yield_pct",
            "Target yield must be positive",
        ));
    }
    let target_factor = input.target_factor.unwrap_or(config.fair_price_target_factor);
    let total_rate = input.interest_rate_pct + input.amortization_rate_pct;
    if total_rate <= Decimal::ZERO {
        return Err(ImmoError::invalid(
            "interest_rate_pct",
            "Interest plus amortization must be positive",
        ));
    }

    let weights = &config.fair_price_weights;
    let mut raw: Vec<(FairPriceMethod, Money, Fraction)> = vec![
        (
            FairPriceMethod::TargetYield,
            round_whole(checked_ratio(
                annual_rent * dec!(100),
                target_yield,
                "target_yield_pct",
            )?),
            weights.target_yield,
        ),
        (
            FairPriceMethod::TargetFactor,
            round_whole(annual_rent * target_factor),
            weights.target_factor,
        ),
    ];

    if let (Some(area), Some(per_sqm)) = (f.living_area_sqm, input.comparable_price_per_sqm) {
        raw.push((
            FairPriceMethod::ComparablePrice,
            round_whole(per_sqm * area),
            weights.comparable_price,
        ));
    }

    let available = (f.monthly_rent - non_allocatable(f, config)) * dec!(12);
    let max_loan = checked_ratio(available * dec!(100), total_rate, "interest_rate_pct")?
        .max(Decimal::ZERO);
    raw.push((
        FairPriceMethod::CashflowNeutral,
        round_whole(max_loan * (Decimal::ONE - config.buying_cost_fraction)),
        weights.cashflow_neutral,
    ));

    let weight_total: Fraction = raw.iter().map(|(_, _, w)| *w).sum();
    if weight_total.is_zero() {
        return Err(ImmoError::ConfigError(
            "fair_price_weights of the available methods sum to 0".into(),
        ));
    }

    let methods: Vec<MethodPrice> = raw
        .into_iter()
        .map(|(method, price, w)| MethodPrice {
            method,
            price,
            weight: w / weight_total,
        })
        .collect();

    let fair_price = round_whole(methods.iter().map(|m| m.price * m.weight).sum());
    if fair_price <= Decimal::ZERO {
        return Err(ImmoError::DivisionByZero {
            context: "fair price rounds to 0".into(),
        });
    }

    let asking = f.purchase_price;
    let deviation_pct = (asking / fair_price - Decimal::ONE) * dec!(100);

    Ok(FairPriceResult {
        methods,
        fair_price,
        asking_price: asking,
        difference: asking - fair_price,
        deviation_pct,
        verdict: verdict(deviation_pct),
        negotiation_target: round_whole(fair_price * (Decimal::ONE - config.negotiation_discount)),
    })
}

pub fn fair_price_analysis(
    input: &FairPriceInput,
    config: &EngineConfig,
) -> ImmoResult<ComputationOutput<FairPriceResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let result = estimate_fair_price(input, config)?;
    if !result
        .methods
        .iter()
        .any(|m| m.method == FairPriceMethod::ComparablePrice)
    {
        warnings.push(
            "No living area or comparable price per m² — comparable method skipped".into(),
        );
    }
    if matches!(
        result.verdict,
        PriceVerdict::Overpriced | PriceVerdict::HeavilyOverpriced
    ) {
        warnings.push(format!(
            "Asking price is {:.1}% above the fair price",
            result.deviation_pct
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fair Price (weighted target yield, price factor, comparables, cashflow-neutral loan)",
        input,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn checked_ratio(numerator: Decimal, rate: Percent, field: &str) -> ImmoResult<Decimal> {
    numerator
        .checked_div(rate)
        .ok_or_else(|| ImmoError::invalid(field, "Rate is too small to price the property"))
}

fn round_whole(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

fn verdict(deviation_pct: Percent) -> PriceVerdict {
    if deviation_pct <= dec!(-5) {
        PriceVerdict::Bargain
    } else if deviation_pct <= dec!(5) {
        PriceVerdict::Fair
    } else if deviation_pct <= dec!(15) {
        PriceVerdict::SlightlyOverpriced
    } else if deviation_pct <= dec!(25) {
        PriceVerdict::Overpriced
    } else {
        PriceVerdict::HeavilyOverpriced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_input() -> FairPriceInput {
        FairPriceInput {
            financials: PropertyFinancials {
                purchase_price: dec!(300000),
                monthly_rent: dec!(950),
                monthly_service_charge: dec!(280),
                living_area_sqm: Some(dec!(75)),
                construction_year: None,
            },
            comparable_price_per_sqm: Some(dec!(3500)),
            interest_rate_pct: dec!(3.8),
            amortization_rate_pct: dec!(1.5),
            target_yield_pct: None,
            target_factor: None,
        }
    }

    fn price_of(r: &FairPriceResult, method: FairPriceMethod) -> Money {
        r.methods
            .iter()
            .find(|m| m.method == method)
            .map(|m| m.price)
            .unwrap()
    }

    #[test]
    fn test_method_prices() {
        let r = estimate_fair_price(&sample_input(), &EngineConfig::default()).unwrap();
        assert_eq!(price_of(&r, FairPriceMethod::TargetYield), dec!(253333));
        assert_eq!(price_of(&r, FairPriceMethod::TargetFactor), dec!(250800));
        assert_eq!(price_of(&r, FairPriceMethod::ComparablePrice), dec!(262500));
        // 10392 / 0.053 * 0.88
        assert_eq!(price_of(&r, FairPriceMethod::CashflowNeutral), dec!(172546));
    }

    #[test]
    fn test_weighted_fair_price_and_verdict() {
        let r = estimate_fair_price(&sample_input(), &EngineConfig::default()).unwrap();
        assert_eq!(r.fair_price, dec!(238249));
        assert_eq!(r.difference, dec!(61751));
        assert_eq!(r.verdict, PriceVerdict::HeavilyOverpriced);
        assert_eq!(r.negotiation_target, dec!(226337));
        assert!((r.deviation_pct - dec!(25.9187)).abs() < dec!(0.001));
    }

    #[test]
    fn test_fair_price_between_method_extremes() {
        let r = estimate_fair_price(&sample_input(), &EngineConfig::default()).unwrap();
        let min = r.methods.iter().map(|m| m.price).min().unwrap();
        let max = r.methods.iter().map(|m| m.price).max().unwrap();
        assert!(r.fair_price >= min && r.fair_price <= max);
        let weight_sum: Decimal = r.methods.iter().map(|m| m.weight).sum();
        assert_eq!(weight_sum, Decimal::ONE);
    }

    #[test]
    fn test_missing_comparable_reweights() {
        let mut input = sample_input();
        input.comparable_price_per_sqm = None;
        let r = estimate_fair_price(&input, &EngineConfig::default()).unwrap();
        assert_eq!(r.methods.len(), 3);
        // (75999.9 + 75240 + 34509.2) / 0.8
        assert_eq!(r.fair_price, dec!(232186));
    }

    #[test]
    fn test_verdict_bands() {
        assert_eq!(verdict(dec!(-5)), PriceVerdict::Bargain);
        assert_eq!(verdict(dec!(-4.9)), PriceVerdict::Fair);
        assert_eq!(verdict(dec!(5)), PriceVerdict::Fair);
        assert_eq!(verdict(dec!(15)), PriceVerdict::SlightlyOverpriced);
        assert_eq!(verdict(dec!(25)), PriceVerdict::Overpriced);
        assert_eq!(verdict(dec!(25.1)), PriceVerdict::HeavilyOverpriced);
    }

    #[test]
    fn test_zero_rent_rejected() {
        let mut input = sample_input();
        input.financials.monthly_rent = Decimal::ZERO;
        assert!(matches!(
            estimate_fair_price(&input, &EngineConfig::default()),
            Err(ImmoError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_envelope_warns_when_overpriced() {
        let out = fair_price_analysis(&sample_input(), &EngineConfig::default()).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("above the fair price"));
    }

    #[test]
    fn test_vanishing_target_yield_is_an_error() {
        let mut input = sample_input();
        input.target_yield_pct = Some(dec!(0.0000000000000000000000001));
        assert!(matches!(
            estimate_fair_price(&input, &EngineConfig::default()),
            Err(ImmoError::InvalidInput { .. })
        ));
    }
}
