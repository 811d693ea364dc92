use serde_json::Value;

use immo_invest_core::analysis::{self, AnalysisInput};
use immo_invest_core::assessment::{self, AssessmentInput};
use immo_invest_core::input::RawPropertyInput;
use immo_invest_core::EngineConfig;

use super::InputArgs;
use crate::input;

pub fn run_analyze(
    args: InputArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let analysis_input: AnalysisInput = input::read_input(args.input.as_deref(), "analyze")?;
    let result = analysis::analyze_property(&analysis_input, config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_assess(
    args: InputArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let assessment_input: AssessmentInput = input::read_input(args.input.as_deref(), "assess")?;
    let result = assessment::property_assessment(&assessment_input, config)?;
    Ok(serde_json::to_value(result)?)
}

/// Validate raw form fields and print the typed input they parse into.
pub fn run_parse(
    args: InputArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let raw: RawPropertyInput = input::read_input(args.input.as_deref(), "parse")?;
    let parsed = raw.parse(config)?;
    Ok(serde_json::to_value(parsed)?)
}
