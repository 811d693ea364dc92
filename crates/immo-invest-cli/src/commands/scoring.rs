use serde_json::Value;

use immo_invest_core::scoring::score::{self, PersonalizedScoreInput};

use super::InputArgs;
use crate::input;

/// The weighting is fixed per profile, so no engine config is involved.
pub fn run_score(args: InputArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let score_input: PersonalizedScoreInput = input::read_input(args.input.as_deref(), "score")?;
    let result = score::personalized_score(&score_input)?;
    Ok(serde_json::to_value(result)?)
}
