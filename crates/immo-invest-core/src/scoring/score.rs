use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ImmoError;
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::ImmoResult;

use super::weights::{
    adjusted_weights, weight_differences, Criterion, ExperienceLevel, InvestmentGoal,
    InvestorProfile, RiskProfile, WeightDifference, WeightTable,
};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One scored criterion as delivered by the upstream analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringCriterion {
    pub name: Criterion,
    /// 0–100
    pub score: Decimal,
    /// Weight the upstream analysis used, in %
    pub base_weight: Decimal,
    #[serde(default)]
    pub justification: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationAction {
    Invest,
    Consider,
    Caution,
    Avoid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecommendation {
    pub action: RecommendationAction,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    Critical,
    Warning,
    Info,
    Positive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalizedWarning {
    pub kind: WarningKind,
    pub title: String,
    pub message: String,
}

/// The cashflow figures the profile warnings look at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CashflowSnapshot {
    pub monthly_cashflow: Money,
    pub gross_yield_pct: Percent,
    pub self_sustaining: bool,
    /// Equity the purchase ties up
    pub equity: Money,
    /// Asking price vs fair price, %; negative means below market
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_deviation_pct: Option<Percent>,
}

#[cfg(feature = "projection")]
impl From<&crate::projection::cashflow::CashflowSummary> for CashflowSnapshot {
    fn from(cf: &crate::projection::cashflow::CashflowSummary) -> Self {
        Self {
            monthly_cashflow: cf.monthly_cashflow,
            gross_yield_pct: cf.gross_yield_pct,
            self_sustaining: cf.self_sustaining,
            equity: cf.equity,
            price_deviation_pct: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalizedScoreInput {
    pub criteria: Vec<ScoringCriterion>,
    #[serde(default)]
    pub profile: InvestorProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cashflow: Option<CashflowSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalizedScore {
    pub base_score: u32,
    pub adjusted_score: u32,
    pub weights: WeightTable,
    pub differences: Vec<WeightDifference>,
    pub recommendation: ProfileRecommendation,
    pub warnings: Vec<PersonalizedWarning>,
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// Weighted average of the criterion scores under the profile's weights.
///
/// Scores outside 0..=100 are clamped. Returns 0 for an empty list or a zero
/// total weight.
pub fn adjusted_score(criteria: &[ScoringCriterion], profile: &InvestorProfile) -> u32 {
    let weights = adjusted_weights(profile);
    weighted_average(criteria, |c| {
        weights.get(&c.name).copied().unwrap_or(Decimal::ZERO)
    })
}

/// Weighted average under the weights the upstream analysis supplied.
pub fn base_score(criteria: &[ScoringCriterion]) -> u32 {
    weighted_average(criteria, |c| c.base_weight.max(Decimal::ZERO))
}

fn weighted_average(
    criteria: &[ScoringCriterion],
    weight_of: impl Fn(&ScoringCriterion) -> Decimal,
) -> u32 {
    let (weighted_sum, total_weight) =
        criteria
            .iter()
            .fold((Decimal::ZERO, Decimal::ZERO), |(sum, total), c| {
                let w = weight_of(c);
                let score = c.score.clamp(Decimal::ZERO, dec!(100));
                (sum + score * w, total + w)
            });
    if total_weight.is_zero() {
        return 0;
    }
    (weighted_sum / total_weight)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Recommendation & warnings
// ---------------------------------------------------------------------------

pub fn profile_recommendation(score: u32, profile: &InvestorProfile) -> ProfileRecommendation {
    let threshold = profile.risk_profile.score_threshold();
    let (action, text) = if score >= threshold + 20 {
        (
            RecommendationAction::Invest,
            "Strongly recommended for your profile",
        )
    } else if score >= threshold {
        (
            RecommendationAction::Consider,
            "Worth a closer look, fits your profile",
        )
    } else if score + 15 >= threshold {
        let text = if profile.experience == ExperienceLevel::Anfaenger {
            "Better left alone as a beginner"
        } else {
            "Approach with caution"
        };
        (RecommendationAction::Caution, text)
    } else {
        (
            RecommendationAction::Avoid,
            "Does not match your profile",
        )
    };
    ProfileRecommendation {
        action,
        text: text.to_string(),
    }
}

pub fn personalized_warnings(
    cashflow: Option<&CashflowSnapshot>,
    score: u32,
    profile: &InvestorProfile,
) -> Vec<PersonalizedWarning> {
    let mut warnings = Vec::new();
    let mut push = |kind, title: &str, message: String| {
        warnings.push(PersonalizedWarning {
            kind,
            title: title.to_string(),
            message,
        })
    };

    if profile.experience == ExperienceLevel::Anfaenger {
        if cashflow.is_some_and(|cf| cf.monthly_cashflow < Decimal::ZERO) {
            push(
                WarningKind::Critical,
                "Negative cashflow",
                "As a beginner, avoid properties that need a monthly top-up.".into(),
            );
        }
        if score < 50 {
            push(
                WarningKind::Warning,
                "Low score",
                "For a first investment, look for a score above 60.".into(),
            );
        }
    }

    if let Some(cf) = cashflow {
        match profile.goal {
            InvestmentGoal::Cashflow => {
                let min_yield = profile.min_gross_yield_pct.unwrap_or(dec!(4));
                if cf.gross_yield_pct < min_yield {
                    push(
                        WarningKind::Warning,
                        "Yield below target",
                        format!(
                            "Gross yield of {:.1}% misses your target of {}%.",
                            cf.gross_yield_pct, min_yield
                        ),
                    );
                }
                if let Some(min_cf) = profile.min_monthly_cashflow {
                    if min_cf > Decimal::ZERO && cf.monthly_cashflow < min_cf {
                        push(
                            WarningKind::Info,
                            "Cashflow below target",
                            format!(
                                "Monthly cashflow of {:.2} is below your target of {}.",
                                cf.monthly_cashflow, min_cf
                            ),
                        );
                    }
                }
                if cf.gross_yield_pct >= dec!(6) {
                    push(
                        WarningKind::Positive,
                        "Strong cashflow property",
                        format!(
                            "{:.1}% gross yield suits a cashflow goal.",
                            cf.gross_yield_pct
                        ),
                    );
                }
            }
            InvestmentGoal::Vermoegensaufbau => {
                if let Some(dev) = cf.price_deviation_pct {
                    if dev < dec!(-15) {
                        push(
                            WarningKind::Positive,
                            "Appreciation potential",
                            format!("Price is {:.1}% below market.", dev.abs()),
                        );
                    }
                }
            }
            _ => {}
        }
    }

    if profile.risk_profile == RiskProfile::Konservativ {
        let threshold = RiskProfile::Konservativ.score_threshold();
        if score < threshold {
            push(
                WarningKind::Warning,
                "Below risk threshold",
                format!("A conservative profile calls for a score of at least {threshold}."),
            );
        }
        if cashflow.is_some_and(|cf| !cf.self_sustaining) {
            push(
                WarningKind::Warning,
                "Not self-sustaining",
                "Conservative investors should prefer self-sustaining properties.".into(),
            );
        }
    }

    if let (Some(cf), Some(available)) = (cashflow, profile.available_equity) {
        if available > Decimal::ZERO && cf.equity > Decimal::ZERO {
            let share = cf.equity / available;
            if share > dec!(0.8) {
                push(
                    WarningKind::Warning,
                    "High equity tie-up",
                    format!(
                        "This purchase ties up {:.0}% of your equity. Keep a reserve.",
                        share * dec!(100)
                    ),
                );
            }
        }
    }

    warnings
}

/// Base and personalized score with weights, recommendation and warnings.
pub fn personalized_score(
    input: &PersonalizedScoreInput,
) -> ImmoResult<ComputationOutput<PersonalizedScore>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.criteria.is_empty() {
        return Err(ImmoError::InsufficientData(
            "At least one scored criterion is required".into(),
        ));
    }
    for c in &input.criteria {
        if c.score < Decimal::ZERO || c.score > dec!(100) {
            return Err(ImmoError::invalid(
                c.name.as_str(),
                format!("Score must lie within 0..=100, got {}", c.score),
            ));
        }
        if c.base_weight < Decimal::ZERO {
            return Err(ImmoError::invalid(
                c.name.as_str(),
                "Base weight cannot be negative",
            ));
        }
    }

    let base = base_score(&input.criteria);
    let adjusted = adjusted_score(&input.criteria, &input.profile);
    let weights = adjusted_weights(&input.profile);
    let differences = weight_differences(&input.profile);
    let recommendation = profile_recommendation(adjusted, &input.profile);
    let profile_warnings = personalized_warnings(input.cashflow.as_ref(), adjusted, &input.profile);

    let diff = i64::from(adjusted) - i64::from(base);
    if diff.abs() >= 10 {
        warnings.push(format!(
            "Profile weighting moves the score by {diff:+} points"
        ));
    }
    log::debug!("score: base={base} adjusted={adjusted} action={:?}", recommendation.action);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Profile-Weighted Criterion Score (goal then risk modifiers, renormalized)",
        input,
        warnings,
        elapsed,
        PersonalizedScore {
            base_score: base,
            adjusted_score: adjusted,
            weights,
            differences,
            recommendation,
            warnings: profile_warnings,
        },
    ))
}
