use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::property::{LoanTerms, PropertyDetails, PropertyFinancials};
use crate::projection::cashflow::compute_cashflow;
use crate::types::{Money, Percent};
use crate::ImmoResult;

const GROUND_LEASE_TERMS: [&str; 4] = ["erbpacht", "erbbaurecht", "ground lease", "leasehold"];
const PREFAB_TERMS: [&str; 2] = ["fertighaus", "prefab"];
/// Prefab houses from these years often contain asbestos or formaldehyde.
const PREFAB_RISK_YEARS: std::ops::RangeInclusive<u16> = 1960..=1990;

/// Passing this many of the six checks is still worth a closer look.
const YELLOW_MIN_PASSED: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficLight {
    Green,
    Yellow,
    Red,
}

impl TrafficLight {
    pub fn recommendation(self) -> &'static str {
        match self {
            TrafficLight::Green => "Buy: every criterion met",
            TrafficLight::Yellow => "Check: some weaknesses",
            TrafficLight::Red => "Caution: several red flags",
        }
    }
}

/// Six pass/fail checks before a purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickCheck {
    pub gross_yield_pct: Percent,
    /// `None` without rent
    pub price_factor: Option<Decimal>,
    pub monthly_cashflow: Money,
    pub gross_yield_ok: bool,
    pub price_factor_ok: bool,
    pub cashflow_ok: bool,
    /// Passes when the class is unknown
    pub energy_class_ok: bool,
    pub no_ground_lease: bool,
    pub no_social_housing: bool,
    pub passed: usize,
    pub total: usize,
    pub light: TrafficLight,
    pub recommendation: String,
}

/// Knock-out criteria that disqualify a property regardless of its numbers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoGoCheck {
    pub no_go: bool,
    pub reasons: Vec<String>,
    /// Doubts that need a manual look but are not knock-outs
    pub warnings: Vec<String>,
}

impl NoGoCheck {
    pub fn investable(&self) -> bool {
        !self.no_go
    }
}

fn mentions(text: Option<&str>, terms: &[&str]) -> bool {
    text.map(str::to_lowercase)
        .is_some_and(|t| terms.iter().any(|term| t.contains(term)))
}

/// Ground lease flagged explicitly or named in the description.
pub fn has_ground_lease(details: &PropertyDetails) -> bool {
    details.ground_lease || mentions(details.description.as_deref(), &GROUND_LEASE_TERMS)
}

pub fn quick_check(
    financials: &PropertyFinancials,
    loan: &LoanTerms,
    details: &PropertyDetails,
    config: &EngineConfig,
) -> ImmoResult<QuickCheck> {
    let cashflow = compute_cashflow(financials, loan, config)?;
    let annual_rent = financials.annual_rent();
    let price_factor = if annual_rent > Decimal::ZERO {
        financials.purchase_price.checked_div(annual_rent)
    } else {
        None
    };

    let gross_yield_ok = cashflow.gross_yield_pct >= config.quick_check_min_gross_yield_pct;
    let price_factor_ok = price_factor.is_some_and(|f| f <= config.quick_check_max_price_factor);
    let cashflow_ok = cashflow.monthly_cashflow >= Decimal::ZERO;
    let energy_class_ok = !details.energy_class.is_some_and(|c| c.is_poor());
    let no_ground_lease = !has_ground_lease(details);
    let no_social_housing = !details.social_housing;

    let results = [
        gross_yield_ok,
        price_factor_ok,
        cashflow_ok,
        energy_class_ok,
        no_ground_lease,
        no_social_housing,
    ];
    let passed = results.iter().filter(|ok| **ok).count();
    let total = results.len();
    let light = if passed == total {
        TrafficLight::Green
    } else if passed >= YELLOW_MIN_PASSED {
        TrafficLight::Yellow
    } else {
        TrafficLight::Red
    };

    Ok(QuickCheck {
        gross_yield_pct: cashflow.gross_yield_pct,
        price_factor,
        monthly_cashflow: cashflow.monthly_cashflow,
        gross_yield_ok,
        price_factor_ok,
        cashflow_ok,
        energy_class_ok,
        no_ground_lease,
        no_social_housing,
        passed,
        total,
        light,
        recommendation: light.recommendation().into(),
    })
}

/// Ground lease, a prefab house from 1960-1990, or energy class G/H.
///
/// A construction year in the prefab window without any hint on the building
/// type only produces a warning.
pub fn check_no_gos(financials: &PropertyFinancials, details: &PropertyDetails) -> NoGoCheck {
    let mut reasons = Vec::new();
    let mut warnings = Vec::new();

    if has_ground_lease(details) {
        reasons.push("Ground lease (Erbpacht/Erbbaurecht)".to_string());
    }

    if let Some(year) = financials.construction_year {
        if PREFAB_RISK_YEARS.contains(&year) {
            let prefab = mentions(details.property_type.as_deref(), &PREFAB_TERMS)
                || mentions(details.description.as_deref(), &PREFAB_TERMS);
            if prefab {
                reasons.push(format!("Prefab house from a problem period (built {year})"));
            } else {
                warnings.push(format!(
                    "Built {year}: verify it is not a prefab house (problem period 1960-1990)"
                ));
            }
        }
    }

    if let Some(class) = details.energy_class.filter(|c| c.is_poor()) {
        reasons.push(format!("Very poor energy class: {class}"));
    }

    NoGoCheck {
        no_go: !reasons.is_empty(),
        reasons,
        warnings,
    }
}
