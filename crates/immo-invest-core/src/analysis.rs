//! One-call property analysis combining every projection.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::EngineConfig;
use crate::assessment::{assess, PropertyAssessment};
use crate::property::{LoanTerms, PropertyDetails, PropertyFinancials};
use crate::types::{with_metadata, ComputationOutput};
use crate::ImmoResult;

use crate::projection::break_even::{find_break_even_equity, BreakEvenResult};
use crate::projection::cashflow::{
    compute_cashflow, investment_metrics, CashflowSummary, InvestmentMetrics,
};
use crate::projection::comparison::{compare_with_etf, InvestmentComparison};
use crate::projection::milestones::{find_milestones, Milestones};
use crate::projection::scenarios::{
    financing_options, generate_scenarios, rental_variations, FinancingOption, RentalVariation,
    ScenarioResult,
};
use crate::projection::schedule::{build_schedule, AmortizationSchedule};
use crate::projection::sensitivity::{live_matrix, SensitivityMatrix};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisInput {
    pub financials: PropertyFinancials,
    pub loan: LoanTerms,
    #[serde(default)]
    pub details: PropertyDetails,
}

/// Everything the analysis screen shows. Parts after `cashflow` are absent
/// when they could not be computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyAnalysis {
    pub cashflow: CashflowSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<InvestmentMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<AmortizationSchedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_even: Option<BreakEvenResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenarios: Option<Vec<ScenarioResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<SensitivityMatrix>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rental_variations: Option<Vec<RentalVariation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub financing_options: Option<Vec<FinancingOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestones: Option<Milestones>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<InvestmentComparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<PropertyAssessment>,
}

impl PropertyAnalysis {
    fn cashflow_only(cashflow: CashflowSummary) -> Self {
        Self {
            cashflow,
            metrics: None,
            schedule: None,
            break_even: None,
            scenarios: None,
            sensitivity: None,
            rental_variations: None,
            financing_options: None,
            milestones: None,
            comparison: None,
            assessment: None,
        }
    }
}

/// Cashflow, metrics, schedule, break-even, scenarios, sensitivity, rent and
/// financing variations, milestones and the ETF comparison for one property.
pub fn analyze_property(
    input: &AnalysisInput,
    config: &EngineConfig,
) -> ImmoResult<ComputationOutput<PropertyAnalysis>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let f = &input.financials;
    let loan = &input.loan;

    let cashflow = compute_cashflow(f, loan, config)?;
    let mut analysis = PropertyAnalysis::cashflow_only(cashflow);

    if f.monthly_rent <= Decimal::ZERO {
        log::warn!("analysis: no rent given, projections skipped");
        warnings.push("No rent given — only the cashflow and checks were computed".into());
        analysis.assessment = Some(assess(f, loan, &input.details, config, &mut warnings)?);
        let elapsed = start.elapsed().as_micros() as u64;
        return Ok(with_metadata(
            "Property Analysis (cashflow only)",
            input,
            warnings,
            elapsed,
            analysis,
        ));
    }

    analysis.metrics = Some(investment_metrics(f)?);

    let schedule = build_schedule(
        f,
        loan,
        config.schedule_years,
        config.default_rent_growth_pct,
        config.default_value_growth_pct,
        config,
    )?;
    if schedule.summary.non_amortizing {
        warnings.push("Loan does not amortize — debt stays constant".into());
    }
    analysis.schedule = Some(schedule);

    if loan.total_rate_pct() > Decimal::ZERO {
        analysis.break_even = Some(find_break_even_equity(
            f,
            loan.interest_rate_pct,
            loan.amortization_rate_pct,
            config,
        )?);
    } else {
        log::warn!("analysis: zero interest and amortization, break-even skipped");
        warnings.push("Interest and amortization are both 0 — break-even skipped".into());
    }

    analysis.scenarios = Some(generate_scenarios(f, loan, config)?);

    analysis.sensitivity = Some(live_matrix(f, loan, config)?);

    analysis.rental_variations = Some(rental_variations(f, loan, config)?);
    analysis.financing_options = Some(financing_options(f, loan.equity, config)?);
    analysis.milestones = Some(find_milestones(f, loan, config.milestone_years, config)?);
    analysis.comparison = Some(compare_with_etf(f, loan, config.schedule_years, config)?);
    analysis.assessment = Some(assess(f, loan, &input.details, config, &mut warnings)?);

    if analysis.cashflow.monthly_cashflow < Decimal::ZERO {
        warnings.push(format!(
            "Negative cashflow of {:.2} per month must be topped up",
            analysis.cashflow.monthly_cashflow.abs()
        ));
    }
    log::debug!(
        "analysis: cashflow={} break_even={:?}",
        analysis.cashflow.monthly_cashflow,
        analysis.break_even.as_ref().map(|b| b.required_equity)
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Property Analysis (cashflow, schedule, break-even, scenarios, sensitivity, checks)",
        input,
        warnings,
        elapsed,
        analysis,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_input() -> AnalysisInput {
        AnalysisInput {
            financials: PropertyFinancials {
                purchase_price: dec!(300000),
                monthly_rent: dec!(950),
                monthly_service_charge: dec!(280),
                living_area_sqm: Some(dec!(75)),
                construction_year: Some(1994),
            },
            loan: LoanTerms::new(dec!(60000), dec!(3.8), dec!(1.5)),
            details: PropertyDetails::default(),
        }
    }

    #[test]
    fn test_full_analysis_has_every_part() {
        let out = analyze_property(&sample_input(), &EngineConfig::default()).unwrap();
        let a = &out.result;
        assert!(a.metrics.is_some());
        assert_eq!(a.schedule.as_ref().unwrap().years.len(), 30);
        assert!(a.break_even.is_some());
        assert_eq!(a.scenarios.as_ref().unwrap().len(), 3);
        assert_eq!(a.rental_variations.as_ref().unwrap().len(), 5);
        assert_eq!(a.financing_options.as_ref().unwrap().len(), 5);
        assert!(a.milestones.is_some());
        assert!(a.comparison.is_some());
        let assessment = a.assessment.as_ref().unwrap();
        assert!(assessment.leverage.is_some());
        assert!(assessment.depreciation.is_some());
    }

    #[test]
    fn test_cashflow_matches_live_sensitivity_cell() {
        let out = analyze_property(&sample_input(), &EngineConfig::default()).unwrap();
        let a = &out.result;
        let m = a.sensitivity.as_ref().unwrap();
        // 60000 is 20% of the price
        let (r, e) = m.current_position.unwrap();
        assert_eq!((r, e), (2, 2));
        assert_eq!(
            m.cells[r][e].monthly_cashflow,
            a.cashflow.monthly_cashflow
        );
    }

    #[test]
    fn test_off_grid_equity_gets_its_own_column() {
        let mut input = sample_input();
        input.loan.equity = dec!(45000);
        let out = analyze_property(&input, &EngineConfig::default()).unwrap();
        let a = &out.result;
        let m = a.sensitivity.as_ref().unwrap();
        assert_eq!(m.equity_candidates.len(), 6);
        assert_eq!(m.current_position, Some((2, 2)));
        assert_eq!(m.cells[2][2].monthly_cashflow, a.cashflow.monthly_cashflow);
    }

    #[test]
    fn test_zero_rent_skips_projections() {
        let mut input = sample_input();
        input.financials.monthly_rent = Decimal::ZERO;
        let out = analyze_property(&input, &EngineConfig::default()).unwrap();
        assert!(out.result.schedule.is_none());
        assert!(out.result.sensitivity.is_none());
        assert!(out.result.assessment.is_some());
        assert!(out.warnings.iter().any(|w| w.contains("No rent")));
    }

    #[test]
    fn test_invalid_loan_fails_before_computing() {
        let mut input = sample_input();
        input.loan.equity = dec!(400000);
        assert!(analyze_property(&input, &EngineConfig::default()).is_err());
    }
}
