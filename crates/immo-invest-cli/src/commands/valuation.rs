use serde_json::Value;

use immo_invest_core::valuation::fair_price::{self, FairPriceInput};
use immo_invest_core::EngineConfig;

use super::InputArgs;
use crate::input;

pub fn run_fair_price(
    args: InputArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let fp_input: FairPriceInput = input::read_input(args.input.as_deref(), "fair-price")?;
    let result = fair_price::fair_price_analysis(&fp_input, config)?;
    Ok(serde_json::to_value(result)?)
}
