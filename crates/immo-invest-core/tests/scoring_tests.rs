use immo_invest_core::scoring::score::{adjusted_score, base_score, ScoringCriterion};
use immo_invest_core::scoring::weights::{
    adjusted_weights, Criterion, InvestmentGoal, InvestorProfile, RiskProfile,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const GOALS: [InvestmentGoal; 5] = [
    InvestmentGoal::Cashflow,
    InvestmentGoal::Vermoegensaufbau,
    InvestmentGoal::Flip,
    InvestmentGoal::Altersvorsorge,
    InvestmentGoal::Steuern,
];

const RISKS: [RiskProfile; 3] = [
    RiskProfile::Konservativ,
    RiskProfile::Ausgewogen,
    RiskProfile::Risikofreudig,
];

fn profile(goal: InvestmentGoal, risk_profile: RiskProfile) -> InvestorProfile {
    InvestorProfile {
        goal,
        risk_profile,
        ..Default::default()
    }
}

fn criteria_from(scores: &[u32]) -> Vec<ScoringCriterion> {
    Criterion::ALL
        .iter()
        .zip(scores)
        .map(|(name, score)| ScoringCriterion {
            name: *name,
            score: Decimal::from(*score),
            base_weight: name.base_weight(),
            justification: String::new(),
        })
        .collect()
}

// ===========================================================================
// Reference scenarios
// ===========================================================================

#[test]
fn test_all_fifty_with_cashflow_goal_scores_fifty() {
    let criteria = criteria_from(&[50; 9]);
    assert_eq!(
        adjusted_score(&criteria, &profile(InvestmentGoal::Cashflow, RiskProfile::Ausgewogen)),
        50
    );
}

#[test]
fn test_weights_renormalize_for_every_profile() {
    for goal in GOALS {
        for risk in RISKS {
            let w = adjusted_weights(&profile(goal, risk));
            let total: Decimal = w.values().copied().sum();
            assert!(
                (total - dec!(100)).abs() <= dec!(0.5),
                "{goal:?}/{risk:?}: total {total}"
            );
            assert!(w.values().all(|v| *v >= Decimal::ZERO));
        }
    }
}

#[test]
fn test_score_is_deterministic() {
    let criteria = criteria_from(&[80, 40, 70, 30, 60, 50, 60, 70, 50]);
    let p = profile(InvestmentGoal::Flip, RiskProfile::Risikofreudig);
    assert_eq!(adjusted_score(&criteria, &p), adjusted_score(&criteria, &p));
}

#[test]
fn test_criteria_json_with_umlaut_name() {
    let json = r#"[
        { "name": "verkäufertyp", "score": "80", "base_weight": "2", "justification": "private seller" },
        { "name": "lage", "score": "40", "base_weight": "20" }
    ]"#;
    let criteria: Vec<ScoringCriterion> = serde_json::from_str(json).unwrap();
    assert_eq!(criteria[0].name, Criterion::Verkaeufertyp);
    // (80*2 + 40*20) / 22 = 43.6
    assert_eq!(base_score(&criteria), 44);
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #[test]
    fn prop_adjusted_score_within_bounds(
        scores in proptest::collection::vec(0u32..=100, 9),
        goal_idx in 0usize..5,
        risk_idx in 0usize..3,
    ) {
        let criteria = criteria_from(&scores);
        let p = profile(GOALS[goal_idx], RISKS[risk_idx]);
        let score = adjusted_score(&criteria, &p);
        prop_assert!(score <= 100);
        let min = *scores.iter().min().unwrap();
        let max = *scores.iter().max().unwrap();
        prop_assert!(score >= min && score <= max, "score {} outside [{}, {}]", score, min, max);
    }

    #[test]
    fn prop_constant_scores_survive_any_profile(
        value in 0u32..=100,
        goal_idx in 0usize..5,
        risk_idx in 0usize..3,
    ) {
        let criteria = criteria_from(&[value; 9]);
        let p = profile(GOALS[goal_idx], RISKS[risk_idx]);
        prop_assert_eq!(adjusted_score(&criteria, &p), value);
    }
}
