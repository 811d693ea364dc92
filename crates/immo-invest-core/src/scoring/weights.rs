use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Percent};

/// Weights per criterion, in % (sum 100).
pub type WeightTable = BTreeMap<Criterion, Decimal>;

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

/// Fixed set of criteria the upstream analysis scores a property on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    CashflowRendite,
    Lage,
    KaufpreisQm,
    Zukunftspotenzial,
    ZustandBaujahr,
    Energieeffizienz,
    Nebenkosten,
    Grundriss,
    #[serde(alias = "verkäufertyp")]
    Verkaeufertyp,
}

impl Criterion {
    pub const ALL: [Criterion; 9] = [
        Criterion::CashflowRendite,
        Criterion::Lage,
        Criterion::KaufpreisQm,
        Criterion::Zukunftspotenzial,
        Criterion::ZustandBaujahr,
        Criterion::Energieeffizienz,
        Criterion::Nebenkosten,
        Criterion::Grundriss,
        Criterion::Verkaeufertyp,
    ];

    pub fn base_weight(self) -> Decimal {
        let w: i64 = match self {
            Criterion::CashflowRendite => 30,
            Criterion::Lage => 20,
            Criterion::KaufpreisQm => 15,
            Criterion::Zukunftspotenzial => 10,
            Criterion::ZustandBaujahr => 10,
            Criterion::Energieeffizienz => 5,
            Criterion::Nebenkosten => 5,
            Criterion::Grundriss => 3,
            Criterion::Verkaeufertyp => 2,
        };
        Decimal::from(w)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Criterion::CashflowRendite => "cashflow_rendite",
            Criterion::Lage => "lage",
            Criterion::KaufpreisQm => "kaufpreis_qm",
            Criterion::Zukunftspotenzial => "zukunftspotenzial",
            Criterion::ZustandBaujahr => "zustand_baujahr",
            Criterion::Energieeffizienz => "energieeffizienz",
            Criterion::Nebenkosten => "nebenkosten",
            Criterion::Grundriss => "grundriss",
            Criterion::Verkaeufertyp => "verkaeufertyp",
        }
    }
}

// ---------------------------------------------------------------------------
// Investor profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentGoal {
    /// Running income first
    #[default]
    Cashflow,
    /// Long-term appreciation in good locations
    Vermoegensaufbau,
    /// Buy, renovate, sell
    Flip,
    /// Stable retirement provision
    Altersvorsorge,
    /// Depreciation and subsidies
    Steuern,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskProfile {
    Konservativ,
    #[default]
    Ausgewogen,
    Risikofreudig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Anfaenger,
    #[default]
    Fortgeschritten,
    Profi,
}

/// Who the score is personalized for. Only read, never stored on criteria.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvestorProfile {
    pub goal: InvestmentGoal,
    pub risk_profile: RiskProfile,
    pub experience: ExperienceLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_monthly_cashflow: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_gross_yield_pct: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_equity: Option<Money>,
}

impl InvestmentGoal {
    /// Additive weight changes, in percentage points.
    pub fn modifiers(self) -> &'static [(Criterion, i64)] {
        use Criterion::*;
        match self {
            InvestmentGoal::Cashflow => &[
                (CashflowRendite, 15),
                (Lage, -5),
                (KaufpreisQm, 5),
                (Zukunftspotenzial, -10),
                (Nebenkosten, 5),
            ],
            InvestmentGoal::Vermoegensaufbau => &[
                (CashflowRendite, -10),
                (Lage, 10),
                (Zukunftspotenzial, 15),
                (KaufpreisQm, -5),
            ],
            InvestmentGoal::Flip => &[
                (CashflowRendite, -20),
                (KaufpreisQm, 20),
                (ZustandBaujahr, 15),
                (Zukunftspotenzial, -5),
                (Lage, -5),
            ],
            InvestmentGoal::Altersvorsorge => &[
                (CashflowRendite, 5),
                (Lage, 5),
                (ZustandBaujahr, 5),
                (Zukunftspotenzial, 5),
                (Energieeffizienz, 5),
                (KaufpreisQm, -10),
            ],
            InvestmentGoal::Steuern => &[
                (CashflowRendite, -5),
                (ZustandBaujahr, 10),
                (Energieeffizienz, 10),
                (Zukunftspotenzial, -5),
            ],
        }
    }
}

impl RiskProfile {
    pub fn modifiers(self) -> &'static [(Criterion, i64)] {
        use Criterion::*;
        match self {
            RiskProfile::Konservativ => &[
                (Lage, 5),
                (ZustandBaujahr, 5),
                (Energieeffizienz, 3),
                (CashflowRendite, -5),
            ],
            RiskProfile::Ausgewogen => &[],
            RiskProfile::Risikofreudig => &[
                (Zukunftspotenzial, 5),
                (KaufpreisQm, 5),
                (ZustandBaujahr, -5),
                (Lage, -5),
            ],
        }
    }

    /// Minimum score at which a property suits this risk appetite.
    pub fn score_threshold(self) -> u32 {
        match self {
            RiskProfile::Konservativ => 65,
            RiskProfile::Ausgewogen => 50,
            RiskProfile::Risikofreudig => 35,
        }
    }
}

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

pub fn base_weights() -> WeightTable {
    Criterion::ALL
        .iter()
        .map(|c| (*c, c.base_weight()))
        .collect()
}

/// Base weights shifted by the goal, then by the risk profile, and scaled
/// back to a total of 100.
///
/// Each modifier is clamped at 0. Rescaled weights are rounded to one
/// decimal, so the total may drift from 100 by a few tenths.
pub fn adjusted_weights(profile: &InvestorProfile) -> WeightTable {
    let mut weights = base_weights();

    for (criterion, delta) in profile
        .goal
        .modifiers()
        .iter()
        .chain(profile.risk_profile.modifiers())
    {
        if let Some(w) = weights.get_mut(criterion) {
            *w = (*w + Decimal::from(*delta)).max(Decimal::ZERO);
        }
    }

    let total: Decimal = weights.values().copied().sum();
    if total.is_zero() || total == dec!(100) {
        return weights;
    }
    let factor = dec!(100) / total;
    for w in weights.values_mut() {
        *w = (*w * factor).round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    }
    weights
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightDifference {
    pub criterion: Criterion,
    pub base: Decimal,
    pub adjusted: Decimal,
    pub diff: Decimal,
    pub direction: Direction,
}

/// Criteria whose weight moved by at least one point for this profile.
pub fn weight_differences(profile: &InvestorProfile) -> Vec<WeightDifference> {
    adjusted_weights(profile)
        .into_iter()
        .filter_map(|(criterion, adjusted)| {
            let base = criterion.base_weight();
            let diff = adjusted - base;
            (diff.abs() >= Decimal::ONE).then(|| WeightDifference {
                criterion,
                base,
                adjusted,
                diff,
                direction: if diff > Decimal::ZERO {
                    Direction::Up
                } else {
                    Direction::Down
                },
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn profile(goal: InvestmentGoal, risk: RiskProfile) -> InvestorProfile {
        InvestorProfile {
            goal,
            risk_profile: risk,
            ..Default::default()
        }
    }

    #[test]
    fn test_base_weights_sum_to_100() {
        let total: Decimal = base_weights().values().copied().sum();
        assert_eq!(total, dec!(100));
    }

    #[test]
    fn test_cashflow_balanced_weights() {
        // +15 -5 +5 -10 +5 = +10 -> total 110, factor 100/110
        let w = adjusted_weights(&profile(InvestmentGoal::Cashflow, RiskProfile::Ausgewogen));
        assert_eq!(w[&Criterion::CashflowRendite], dec!(40.9));
        assert_eq!(w[&Criterion::Lage], dec!(13.6));
        assert_eq!(w[&Criterion::Zukunftspotenzial], Decimal::ZERO);
    }

    #[test]
    fn test_altersvorsorge_renormalizes() {
        // +5 +5 +5 +5 +5 -10 = +15 -> total 115 before rescaling
        let w = adjusted_weights(&profile(
            InvestmentGoal::Altersvorsorge,
            RiskProfile::Ausgewogen,
        ));
        let total: Decimal = w.values().copied().sum();
        assert!((total - dec!(100)).abs() <= dec!(0.5), "total {total}");
    }

    #[test]
    fn test_flip_clamps_cashflow_at_zero() {
        let w = adjusted_weights(&profile(InvestmentGoal::Flip, RiskProfile::Konservativ));
        // 30 - 20 - 5 = 5, never negative
        assert!(w[&Criterion::CashflowRendite] >= Decimal::ZERO);
        assert!(w.values().all(|v| *v >= Decimal::ZERO));
    }

    #[test]
    fn test_weight_differences_cashflow_goal() {
        let diffs = weight_differences(&profile(InvestmentGoal::Cashflow, RiskProfile::Ausgewogen));
        let up: Vec<Criterion> = diffs
            .iter()
            .filter(|d| d.direction == Direction::Up)
            .map(|d| d.criterion)
            .collect();
        // Nebenkosten: 10 / 1.1 = 9.1 against a base of 5
        assert_eq!(
            up,
            vec![
                Criterion::CashflowRendite,
                Criterion::KaufpreisQm,
                Criterion::Nebenkosten
            ]
        );
        assert!(diffs
            .iter()
            .any(|d| d.criterion == Criterion::Zukunftspotenzial && d.direction == Direction::Down));
    }

    #[test]
    fn test_umlaut_alias() {
        let c: Criterion = serde_json::from_str("\"verkäufertyp\"").unwrap();
        assert_eq!(c, Criterion::Verkaeufertyp);
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"verkaeufertyp\"");
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(RiskProfile::Konservativ.score_threshold(), 65);
        assert_eq!(RiskProfile::Ausgewogen.score_threshold(), 50);
        assert_eq!(RiskProfile::Risikofreudig.score_threshold(), 35);
    }
}
