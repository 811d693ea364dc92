use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::{EngineConfig, FinancingPreset, ScenarioPreset};
use crate::error::ImmoError;
use crate::property::{LoanTerms, PropertyFinancials};
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::ImmoResult;

use super::cashflow::{compute_cashflow, CashflowSummary};
use super::schedule::{build_schedule, AmortizationSchedule};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioAssumptions {
    pub interest_rate_pct: Percent,
    pub amortization_rate_pct: Percent,
    pub rent_growth_pct: Percent,
    pub value_growth_pct: Percent,
    pub vacancy_pct: Percent,
    /// Cold rent after vacancy
    pub effective_monthly_rent: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub description: String,
    pub assumptions: ScenarioAssumptions,
    pub cashflow: CashflowSummary,
    pub schedule: AmortizationSchedule,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalVariation {
    pub rent_change_pct: Percent,
    pub monthly_rent: Money,
    pub monthly_cashflow: Money,
    pub annual_cashflow: Money,
    pub self_sustaining: bool,
    pub gross_yield_pct: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancingOption {
    pub name: String,
    pub interest_rate_pct: Percent,
    pub amortization_rate_pct: Percent,
    pub monthly_rate: Money,
    pub monthly_cashflow: Money,
    pub self_sustaining: bool,
    /// `round(100 / amortization)`; None when nothing is amortized
    pub years_to_payoff: Option<u32>,
    /// Monthly rate × 12 × years to payoff
    pub estimated_total_cost: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioInput {
    pub financials: PropertyFinancials,
    pub loan: LoanTerms,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub scenarios: Vec<ScenarioResult>,
    pub rental_variations: Vec<RentalVariation>,
    pub financing_options: Vec<FinancingOption>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run every configured market scenario against the live loan terms.
pub fn generate_scenarios(
    financials: &PropertyFinancials,
    loan: &LoanTerms,
    config: &EngineConfig,
) -> ImmoResult<Vec<ScenarioResult>> {
    loan.validate(financials)?;
    config
        .scenarios
        .iter()
        .map(|preset| run_scenario(financials, loan, preset, config))
        .collect()
}

/// Cashflow at each configured rent change.
pub fn rental_variations(
    financials: &PropertyFinancials,
    loan: &LoanTerms,
    config: &EngineConfig,
) -> ImmoResult<Vec<RentalVariation>> {
    config
        .rent_variation_pcts
        .iter()
        .map(|&pct| {
            let varied = PropertyFinancials {
                monthly_rent: scaled_rent(financials.monthly_rent, pct, "rent_variation_pcts")?,
                ..financials.clone()
            };
            let cf = compute_cashflow(&varied, loan, config)?;
            Ok(RentalVariation {
                rent_change_pct: pct,
                monthly_rent: varied.monthly_rent,
                monthly_cashflow: cf.monthly_cashflow,
                annual_cashflow: cf.annual_cashflow,
                self_sustaining: cf.self_sustaining,
                gross_yield_pct: cf.gross_yield_pct,
            })
        })
        .collect()
}

/// Compare the configured (interest, amortization) presets at the live equity.
pub fn financing_options(
    financials: &PropertyFinancials,
    equity: Money,
    config: &EngineConfig,
) -> ImmoResult<Vec<FinancingOption>> {
    config
        .financing_presets
        .iter()
        .map(|preset| financing_option(financials, equity, preset, config))
        .collect()
}

/// Scenarios, rental variations and financing options in one envelope.
pub fn scenario_comparison(
    input: &ScenarioInput,
    config: &EngineConfig,
) -> ImmoResult<ComputationOutput<ScenarioComparison>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let scenarios = generate_scenarios(&input.financials, &input.loan, config)?;
    let rental_variations = rental_variations(&input.financials, &input.loan, config)?;
    let financing_options = financing_options(&input.financials, input.loan.equity, config)?;

    if let Some(worst) = scenarios
        .iter()
        .min_by_key(|s| s.cashflow.monthly_cashflow)
    {
        if worst.cashflow.monthly_cashflow < Decimal::ZERO {
            warnings.push(format!(
                "{} scenario: negative cashflow of {:.2} per month",
                worst.name, worst.cashflow.monthly_cashflow
            ));
        }
    }
    if scenarios.iter().any(|s| s.schedule.summary.non_amortizing) {
        warnings.push("At least one scenario does not amortize the loan".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Scenario Analysis (interest offset, vacancy, growth presets)",
        input,
        warnings,
        elapsed,
        ScenarioComparison {
            scenarios,
            rental_variations,
            financing_options,
        },
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Rent changed by `pct` percent.
fn scaled_rent(rent: Money, pct: Percent, setting: &str) -> ImmoResult<Money> {
    rent.checked_mul(Decimal::ONE + pct / dec!(100))
        .ok_or_else(|| ImmoError::ConfigError(format!("{setting} scales the rent out of range")))
}

fn run_scenario(
    financials: &PropertyFinancials,
    loan: &LoanTerms,
    preset: &ScenarioPreset,
    config: &EngineConfig,
) -> ImmoResult<ScenarioResult> {
    let interest_rate_pct =
        (loan.interest_rate_pct + preset.interest_offset_pct).max(preset.min_interest_rate_pct);
    let effective_monthly_rent =
        scaled_rent(financials.monthly_rent, -preset.vacancy_pct, "scenarios.vacancy_pct")?;

    let scenario_financials = PropertyFinancials {
        monthly_rent: effective_monthly_rent,
        ..financials.clone()
    };
    let scenario_loan = loan.with_interest_rate(interest_rate_pct);

    let cashflow = compute_cashflow(&scenario_financials, &scenario_loan, config)?;
    let schedule = build_schedule(
        &scenario_financials,
        &scenario_loan,
        config.schedule_years,
        preset.rent_growth_pct,
        preset.value_growth_pct,
        config,
    )?;
    log::debug!(
        "scenario {}: rate={} rent={} cashflow={}",
        preset.name,
        interest_rate_pct,
        effective_monthly_rent,
        cashflow.monthly_cashflow
    );

    Ok(ScenarioResult {
        name: preset.name.clone(),
        description: preset.description.clone(),
        assumptions: ScenarioAssumptions {
            interest_rate_pct,
            amortization_rate_pct: loan.amortization_rate_pct,
            rent_growth_pct: preset.rent_growth_pct,
            value_growth_pct: preset.value_growth_pct,
            vacancy_pct: preset.vacancy_pct,
            effective_monthly_rent,
        },
        cashflow,
        schedule,
    })
}

fn financing_option(
    financials: &PropertyFinancials,
    equity: Money,
    preset: &FinancingPreset,
    config: &EngineConfig,
) -> ImmoResult<FinancingOption> {
    let loan = LoanTerms::new(
        equity,
        preset.interest_rate_pct,
        preset.amortization_rate_pct,
    );
    let cf = compute_cashflow(financials, &loan, config)?;

    let years_to_payoff = if preset.amortization_rate_pct > Decimal::ZERO {
        (dec!(100) / preset.amortization_rate_pct)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
    } else {
        None
    };
    let estimated_total_cost =
        years_to_payoff.map(|y| cf.monthly_rate * dec!(12) * Decimal::from(y));

    Ok(FinancingOption {
        name: preset.name.clone(),
        interest_rate_pct: preset.interest_rate_pct,
        amortization_rate_pct: preset.amortization_rate_pct,
        monthly_rate: cf.monthly_rate,
        monthly_cashflow: cf.monthly_cashflow,
        self_sustaining: cf.self_sustaining,
        years_to_payoff,
        estimated_total_cost,
    })
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

    fn sample_loan() -> LoanTerms {
        LoanTerms::new(dec!(60000), dec!(3.8), dec!(1.5))
    }

    #[test]
    fn test_three_default_scenarios() {
        let cfg = EngineConfig::default();
        let s = generate_scenarios(&sample_property(), &sample_loan(), &cfg).unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s[0].name, "Conservative");
        assert_eq!(s[0].assumptions.interest_rate_pct, dec!(4.8));
        assert_eq!(s[0].assumptions.effective_monthly_rent, dec!(902.5));
        assert_eq!(s[1].assumptions.interest_rate_pct, dec!(3.8));
        assert_eq!(s[1].assumptions.effective_monthly_rent, dec!(931));
        assert_eq!(s[2].assumptions.interest_rate_pct, dec!(3.3));
        assert_eq!(s[2].schedule.years.len(), 30);
    }

    #[test]
    fn test_scenarios_are_ordered_by_cashflow() {
        let cfg = EngineConfig::default();
        let s = generate_scenarios(&sample_property(), &sample_loan(), &cfg).unwrap();
        assert!(s[0].cashflow.monthly_cashflow < s[1].cashflow.monthly_cashflow);
        assert!(s[1].cashflow.monthly_cashflow < s[2].cashflow.monthly_cashflow);
    }

    #[test]
    fn test_optimistic_rate_floor() {
        let cfg = EngineConfig::default();
        let loan = LoanTerms::new(dec!(60000), dec!(0.7), dec!(1.5));
        let s = generate_scenarios(&sample_property(), &loan, &cfg).unwrap();
        assert_eq!(s[2].assumptions.interest_rate_pct, dec!(0.5));
    }

    #[test]
    fn test_zero_rent_variation_matches_cashflow() {
        let cfg = EngineConfig::default();
        let variations = rental_variations(&sample_property(), &sample_loan(), &cfg).unwrap();
        let base = compute_cashflow(&sample_property(), &sample_loan(), &cfg).unwrap();
        let zero = variations
            .iter()
            .find(|v| v.rent_change_pct.is_zero())
            .unwrap();
        assert_eq!(zero.monthly_cashflow, base.monthly_cashflow);
        assert_eq!(variations[0].monthly_rent, dec!(760));
        assert_eq!(variations[4].monthly_rent, dec!(1140));
    }

    #[test]
    fn test_financing_options() {
        let cfg = EngineConfig::default();
        let options = financing_options(&sample_property(), dec!(60000), &cfg).unwrap();
        assert_eq!(options.len(), 5);
        // Standard: 240000 * 5% / 12 = 1000
        let standard = &options[1];
        assert_eq!(standard.monthly_rate, dec!(1000));
        assert_eq!(standard.years_to_payoff, Some(80));
        assert_eq!(standard.estimated_total_cost, Some(dec!(960000)));
        // Aggressive amortization: 100 / 3 = 33.3 -> 33
        assert_eq!(options[3].years_to_payoff, Some(33));
    }

    #[test]
    fn test_zero_amortization_has_no_payoff() {
        let cfg = EngineConfig {
            financing_presets: vec![FinancingPreset {
                name: "Interest only".into(),
                interest_rate_pct: dec!(4),
                amortization_rate_pct: Decimal::ZERO,
            }],
            ..EngineConfig::default()
        };
        let options = financing_options(&sample_property(), dec!(60000), &cfg).unwrap();
        assert_eq!(options[0].years_to_payoff, None);
        assert_eq!(options[0].estimated_total_cost, None);
    }

    #[test]
    fn test_comparison_envelope_warns_on_negative_scenario() {
        let input = ScenarioInput {
            financials: sample_property(),
            loan: sample_loan(),
        };
        let out = scenario_comparison(&input, &EngineConfig::default()).unwrap();
        assert!(out.warnings.iter().any(|w| w.starts_with("Conservative")));
        assert_eq!(out.result.rental_variations.len(), 5);
    }

    #[test]
    fn test_out_of_range_rent_variation_is_an_error() {
        let cfg = EngineConfig {
            rent_variation_pcts: vec![Decimal::MAX / dec!(1000)],
            ..EngineConfig::default()
        };
        let loan = LoanTerms::new(dec!(60000), dec!(3.8), dec!(1.5));
        let mut p = sample_property();
        p.monthly_rent = dec!(1000000000000);
        assert!(matches!(
            rental_variations(&p, &loan, &cfg),
            Err(ImmoError::ConfigError(_))
        ));
    }
}
