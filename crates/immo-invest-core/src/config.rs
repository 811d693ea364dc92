//! Business policy constants.
//!
//! None of these are derived; they are the house assumptions of the analysis
//! and can be overridden from a YAML/JSON file.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ImmoError;
use crate::types::{Fraction, Percent};
use crate::ImmoResult;

/// Hard ceiling for `max_horizon_years`.
pub const HORIZON_LIMIT_YEARS: u32 = 100;

/// What the schedule does when the payment cannot cover first-year interest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonAmortizingPolicy {
    /// Hold the debt constant and flag every year
    #[default]
    Flag,
    /// Fail with `ImmoError::NonAmortizingLoan`
    Reject,
}

/// Weights of the four fair-price methods. Must sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FairPriceWeights {
    pub target_yield: Fraction,
    pub target_factor: Fraction,
    pub comparable_price: Fraction,
    pub cashflow_neutral: Fraction,
}

impl Default for FairPriceWeights {
    fn default() -> Self {
        Self {
            target_yield: dec!(0.3),
            target_factor: dec!(0.3),
            comparable_price: dec!(0.2),
            cashflow_neutral: dec!(0.2),
        }
    }
}

impl FairPriceWeights {
    pub fn sum(&self) -> Fraction {
        self.target_yield + self.target_factor + self.comparable_price + self.cashflow_neutral
    }
}

/// Assumptions of a named market scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioPreset {
    pub name: String,
    pub description: String,
    /// Added to the live interest rate (percentage points)
    pub interest_offset_pct: Percent,
    /// Floor for the shifted interest rate
    pub min_interest_rate_pct: Percent,
    /// Rent lost to vacancy, % of cold rent
    pub vacancy_pct: Percent,
    pub rent_growth_pct: Percent,
    pub value_growth_pct: Percent,
}

/// A named interest/amortization combination offered for comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingPreset {
    pub name: String,
    pub interest_rate_pct: Percent,
    pub amortization_rate_pct: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Share of the monthly service charge a landlord cannot pass on to the tenant
    pub non_allocatable_fraction: Fraction,
    /// Purchase side costs (transfer tax, notary, agent) as a share of the price
    pub buying_cost_fraction: Fraction,
    pub default_interest_rate_pct: Percent,
    pub default_amortization_rate_pct: Percent,
    pub default_rent_growth_pct: Percent,
    pub default_value_growth_pct: Percent,
    pub schedule_years: u32,
    pub milestone_years: u32,
    /// Longest horizon any projection accepts
    pub max_horizon_years: u32,
    /// Annual return assumed for the ETF benchmark
    pub etf_return_pct: Percent,
    pub fair_price_weights: FairPriceWeights,
    pub fair_price_target_yield_pct: Percent,
    pub fair_price_target_factor: Decimal,
    /// Negotiation target sits this far below the fair price
    pub negotiation_discount: Fraction,
    pub non_amortizing_policy: NonAmortizingPolicy,
    /// Offsets (percentage points) around the live rate for the sensitivity rows
    pub sensitivity_rate_offsets: Vec<Percent>,
    pub sensitivity_min_rate_pct: Percent,
    /// Equity levels (% of price) for the sensitivity columns
    pub sensitivity_equity_pcts: Vec<Percent>,
    /// Rent changes (%) for the rental variation table
    pub rent_variation_pcts: Vec<Percent>,
    /// Building share of the purchase price; the rest is land and not depreciable
    pub building_share_fraction: Fraction,
    /// Quick check passes the yield test at or above this gross yield
    pub quick_check_min_gross_yield_pct: Percent,
    /// Quick check passes the price test at or below this price factor
    pub quick_check_max_price_factor: Decimal,
    pub scenarios: Vec<ScenarioPreset>,
    pub financing_presets: Vec<FinancingPreset>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            non_allocatable_fraction: dec!(0.30),
            buying_cost_fraction: dec!(0.12),
            default_interest_rate_pct: dec!(3.75),
            default_amortization_rate_pct: dec!(1.25),
            default_rent_growth_pct: dec!(1.5),
            default_value_growth_pct: dec!(1.5),
            schedule_years: 30,
            milestone_years: 40,
            max_horizon_years: 60,
            etf_return_pct: dec!(7.0),
            fair_price_weights: FairPriceWeights::default(),
            fair_price_target_yield_pct: dec!(4.5),
            fair_price_target_factor: dec!(22),
            negotiation_discount: dec!(0.05),
            non_amortizing_policy: NonAmortizingPolicy::Flag,
            sensitivity_rate_offsets: vec![dec!(-1.0), dec!(-0.5), dec!(0), dec!(0.5), dec!(1.0)],
            sensitivity_min_rate_pct: dec!(0.5),
            sensitivity_equity_pcts: vec![dec!(0), dec!(10), dec!(20), dec!(30), dec!(40)],
            rent_variation_pcts: vec![dec!(-20), dec!(-10), dec!(0), dec!(10), dec!(20)],
            building_share_fraction: dec!(0.80),
            quick_check_min_gross_yield_pct: dec!(4),
            quick_check_max_price_factor: dec!(25),
            scenarios: default_scenarios(),
            financing_presets: default_financing_presets(),
        }
    }
}

fn default_scenarios() -> Vec<ScenarioPreset> {
    vec![
        ScenarioPreset {
            name: "Conservative".into(),
            description: "Worst case with higher interest and vacancy".into(),
            interest_offset_pct: dec!(1.0),
            min_interest_rate_pct: dec!(0.5),
            vacancy_pct: dec!(5),
            rent_growth_pct: dec!(0.5),
            value_growth_pct: dec!(0.5),
        },
        ScenarioPreset {
            name: "Realistic".into(),
            description: "Expected case with the current parameters".into(),
            interest_offset_pct: Decimal::ZERO,
            min_interest_rate_pct: dec!(0.5),
            vacancy_pct: dec!(2),
            rent_growth_pct: dec!(1.5),
            value_growth_pct: dec!(1.5),
        },
        ScenarioPreset {
            name: "Optimistic".into(),
            description: "Best case with lower interest and strong appreciation".into(),
            interest_offset_pct: dec!(-0.5),
            min_interest_rate_pct: dec!(0.5),
            vacancy_pct: dec!(2),
            rent_growth_pct: dec!(2.5),
            value_growth_pct: dec!(2.0),
        },
    ]
}

fn default_financing_presets() -> Vec<FinancingPreset> {
    let preset = |name: &str, interest: Decimal, amortization: Decimal| FinancingPreset {
        name: name.into(),
        interest_rate_pct: interest,
        amortization_rate_pct: amortization,
    };
    vec![
        preset("Low rate", dec!(3.5), dec!(1.0)),
        preset("Standard", dec!(3.75), dec!(1.25)),
        preset("Fast amortization", dec!(3.75), dec!(2.0)),
        preset("Aggressive amortization", dec!(3.75), dec!(3.0)),
        preset("High interest", dec!(5.0), dec!(1.5)),
    ]
}

impl EngineConfig {
    pub fn validate(&self) -> ImmoResult<()> {
        check_fraction("non_allocatable_fraction", self.non_allocatable_fraction)?;
        check_fraction("buying_cost_fraction", self.buying_cost_fraction)?;
        check_fraction("negotiation_discount", self.negotiation_discount)?;
        check_fraction("building_share_fraction", self.building_share_fraction)?;

        let w = &self.fair_price_weights;
        for (field, value) in [
            ("fair_price_weights.target_yield", w.target_yield),
            ("fair_price_weights.target_factor", w.target_factor),
            ("fair_price_weights.comparable_price", w.comparable_price),
            ("fair_price_weights.cashflow_neutral", w.cashflow_neutral),
        ] {
            check_fraction(field, value)?;
        }
        if (w.sum() - Decimal::ONE).abs() > dec!(0.0001) {
            return Err(ImmoError::ConfigError(format!(
                "fair_price_weights must sum to 1, got {}",
                w.sum()
            )));
        }

        if self.schedule_years == 0 || self.milestone_years == 0 {
            return Err(ImmoError::ConfigError(
                "schedule_years and milestone_years must be at least 1".into(),
            ));
        }
        if self.max_horizon_years == 0 || self.max_horizon_years > HORIZON_LIMIT_YEARS {
            return Err(ImmoError::ConfigError(format!(
                "max_horizon_years must lie within 1..={HORIZON_LIMIT_YEARS}, got {}",
                self.max_horizon_years
            )));
        }
        if self.schedule_years > self.max_horizon_years
            || self.milestone_years > self.max_horizon_years
        {
            return Err(ImmoError::ConfigError(format!(
                "schedule_years and milestone_years cannot exceed max_horizon_years ({})",
                self.max_horizon_years
            )));
        }
        if self.fair_price_target_yield_pct <= Decimal::ZERO {
            return Err(ImmoError::ConfigError(
                "fair_price_target_yield_pct must be positive".into(),
            ));
        }
        if self.quick_check_min_gross_yield_pct < Decimal::ZERO
            || self.quick_check_max_price_factor <= Decimal::ZERO
        {
            return Err(ImmoError::ConfigError(
                "quick_check_min_gross_yield_pct cannot be negative and quick_check_max_price_factor must be positive".into(),
            ));
        }
        if self.sensitivity_rate_offsets.is_empty() || self.sensitivity_equity_pcts.is_empty() {
            return Err(ImmoError::ConfigError(
                "sensitivity candidate lists cannot be empty".into(),
            ));
        }
        if self
            .sensitivity_equity_pcts
            .iter()
            .any(|p| *p < Decimal::ZERO || *p > dec!(100))
        {
            return Err(ImmoError::ConfigError(
                "sensitivity_equity_pcts must lie within 0..=100".into(),
            ));
        }
        if self
            .rent_variation_pcts
            .iter()
            .any(|p| *p <= dec!(-100) || *p > dec!(1000))
        {
            return Err(ImmoError::ConfigError(
                "rent_variation_pcts must lie above -100 and at most 1000".into(),
            ));
        }
        if self
            .scenarios
            .iter()
            .any(|s| s.vacancy_pct < Decimal::ZERO || s.vacancy_pct > dec!(100))
        {
            return Err(ImmoError::ConfigError(
                "scenario vacancy_pct must lie within 0..=100".into(),
            ));
        }
        Ok(())
    }
}

fn check_fraction(field: &str, value: Fraction) -> ImmoResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(ImmoError::ConfigError(format!(
            "{field} must lie within 0..=1, got {value}"
        )));
    }
    Ok(())
}
