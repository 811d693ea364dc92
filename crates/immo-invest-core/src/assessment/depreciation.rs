use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::ImmoError;
use crate::property::PropertyFinancials;
use crate::types::{Money, Percent};
use crate::ImmoResult;

/// Years over which linear and declining-balance totals are compared.
pub const COMPARISON_YEARS: u32 = 15;

/// Declining-balance rate for new builds, % of the residual value.
pub const DECLINING_RATE_PCT: Percent = dec!(5);

/// First construction year eligible for 3% linear and declining balance.
const NEW_BUILD_FROM: u16 = 2023;
const PRE_WAR_BEFORE: u16 = 1925;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecliningBalance {
    pub rate_pct: Percent,
    pub total: Money,
    /// Declining total minus linear total over the comparison window
    pub advantage_over_linear: Money,
}

/// Tax depreciation (AfA) of the building part of the price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepreciationPlan {
    pub building_value: Money,
    pub linear_rate_pct: Percent,
    pub useful_life_years: u32,
    pub annual_linear: Money,
    /// Linear depreciation over `comparison_years`
    pub linear_total: Money,
    pub comparison_years: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declining: Option<DecliningBalance>,
}

/// Linear rate and useful life for a construction year.
pub fn linear_band(construction_year: u16) -> (Percent, u32) {
    if construction_year >= NEW_BUILD_FROM {
        (dec!(3), 33)
    } else if construction_year >= PRE_WAR_BEFORE {
        (dec!(2), 50)
    } else {
        (dec!(2.5), 40)
    }
}

/// Building value is the configured share of the price. New builds also get
/// the declining-balance comparison.
pub fn depreciation_plan(
    financials: &PropertyFinancials,
    config: &EngineConfig,
) -> ImmoResult<DepreciationPlan> {
    financials.validate()?;
    let year = financials.construction_year.ok_or_else(|| {
        ImmoError::InsufficientData("Depreciation needs the construction year".into())
    })?;

    let building_value = financials.purchase_price * config.building_share_fraction;
    let (linear_rate_pct, useful_life_years) = linear_band(year);
    let annual_linear = building_value * linear_rate_pct / dec!(100);
    let linear_total = annual_linear * Decimal::from(COMPARISON_YEARS);

    let declining = (year >= NEW_BUILD_FROM).then(|| {
        let mut residual = building_value;
        let mut total = Decimal::ZERO;
        for _ in 0..COMPARISON_YEARS {
            let amount = residual * DECLINING_RATE_PCT / dec!(100);
            total += amount;
            residual -= amount;
        }
        DecliningBalance {
            rate_pct: DECLINING_RATE_PCT,
            total: round_cents(total),
            advantage_over_linear: round_cents(total - linear_total),
        }
    });

    Ok(DepreciationPlan {
        building_value: round_cents(building_value),
        linear_rate_pct,
        useful_life_years,
        annual_linear: round_cents(annual_linear),
        linear_total: round_cents(linear_total),
        comparison_years: COMPARISON_YEARS,
        declining,
    })
}

fn round_cents(value: Money) -> Money {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
