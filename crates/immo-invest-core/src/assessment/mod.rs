//! Qualitative checks on top of the cashflow numbers: leverage, tax
//! depreciation, the six-point quick check and knock-out criteria.

pub mod checks;
pub mod depreciation;
pub mod leverage;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::EngineConfig;
use crate::property::{LoanTerms, PropertyDetails, PropertyFinancials};
use crate::types::{with_metadata, ComputationOutput};
use crate::ImmoResult;

use checks::{check_no_gos, quick_check, NoGoCheck, QuickCheck};
use depreciation::{depreciation_plan, DepreciationPlan};
use leverage::{leverage_effect, LeverageEffect};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentInput {
    pub financials: PropertyFinancials,
    pub loan: LoanTerms,
    #[serde(default)]
    pub details: PropertyDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyAssessment {
    /// Absent without equity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leverage: Option<LeverageEffect>,
    /// Absent without a construction year
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depreciation: Option<DepreciationPlan>,
    pub quick_check: QuickCheck,
    pub no_go: NoGoCheck,
}

/// Runs every check, collecting the human-readable findings into `warnings`.
pub(crate) fn assess(
    financials: &PropertyFinancials,
    loan: &LoanTerms,
    details: &PropertyDetails,
    config: &EngineConfig,
    warnings: &mut Vec<String>,
) -> ImmoResult<PropertyAssessment> {
    let quick_check = quick_check(financials, loan, details, config)?;

    let leverage = if loan.equity > Decimal::ZERO {
        let effect = leverage_effect(financials, loan)?;
        if !effect.positive_leverage {
            warnings.push(format!(
                "Negative leverage: interest {}% is not below the object yield {:.2}%",
                effect.interest_rate_pct, effect.object_yield_pct
            ));
        }
        Some(effect)
    } else {
        warnings.push("No equity: leverage effect not computed".into());
        None
    };

    let depreciation = match financials.construction_year {
        Some(_) => Some(depreciation_plan(financials, config)?),
        None => {
            warnings.push("No construction year: depreciation not computed".into());
            None
        }
    };

    let no_go = check_no_gos(financials, details);
    for reason in &no_go.reasons {
        warnings.push(format!("No-go: {reason}"));
    }
    warnings.extend(no_go.warnings.iter().cloned());

    log::debug!(
        "assessment: quick check {}/{} ({:?}), no_go={}",
        quick_check.passed,
        quick_check.total,
        quick_check.light,
        no_go.no_go
    );

    Ok(PropertyAssessment {
        leverage,
        depreciation,
        quick_check,
        no_go,
    })
}

/// Leverage effect, depreciation, quick check and no-go criteria, wrapped
/// with warnings and metadata.
pub fn property_assessment(
    input: &AssessmentInput,
    config: &EngineConfig,
) -> ImmoResult<ComputationOutput<PropertyAssessment>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let assessment = assess(
        &input.financials,
        &input.loan,
        &input.details,
        config,
        &mut warnings,
    )?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Property Assessment (leverage, depreciation, quick check, no-go criteria)",
        input,
        warnings,
        elapsed,
        assessment,
    ))
}
