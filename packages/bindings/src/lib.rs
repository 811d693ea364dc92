use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::Serialize;

use immo_invest_core::{EngineConfig, ImmoResult};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Policy constants from an optional JSON string, validated.
fn parse_config(config_json: Option<String>) -> NapiResult<EngineConfig> {
    let config = match config_json {
        Some(json) => serde_json::from_str::<EngineConfig>(&json).map_err(to_napi_error)?,
        None => EngineConfig::default(),
    };
    config.validate().map_err(to_napi_error)?;
    Ok(config)
}

/// Deserialize the input, run the computation, serialize the output.
fn call<I, O>(
    input_json: &str,
    config_json: Option<String>,
    f: impl FnOnce(&I, &EngineConfig) -> ImmoResult<O>,
) -> NapiResult<String>
where
    I: DeserializeOwned,
    O: Serialize,
{
    let config = parse_config(config_json)?;
    let input: I = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let output = f(&input, &config).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_cashflow(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    call(
        &input_json,
        config_json,
        immo_invest_core::projection::cashflow::cashflow_analysis,
    )
}

#[napi]
pub fn amortization_schedule(
    input_json: String,
    config_json: Option<String>,
) -> NapiResult<String> {
    call(
        &input_json,
        config_json,
        immo_invest_core::projection::schedule::amortization_schedule,
    )
}

#[napi]
pub fn break_even_equity(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    call(
        &input_json,
        config_json,
        immo_invest_core::projection::break_even::break_even_analysis,
    )
}

#[napi]
pub fn sensitivity_matrix(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    call(
        &input_json,
        config_json,
        immo_invest_core::projection::sensitivity::sensitivity_analysis,
    )
}

#[napi]
pub fn scenario_comparison(
    input_json: String,
    config_json: Option<String>,
) -> NapiResult<String> {
    call(
        &input_json,
        config_json,
        immo_invest_core::projection::scenarios::scenario_comparison,
    )
}

#[napi]
pub fn milestones(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    call(
        &input_json,
        config_json,
        immo_invest_core::projection::milestones::milestone_analysis,
    )
}

#[napi]
pub fn compare_with_etf(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    call(
        &input_json,
        config_json,
        immo_invest_core::projection::comparison::investment_comparison,
    )
}

#[napi]
pub fn assess_property(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    call(
        &input_json,
        config_json,
        immo_invest_core::assessment::property_assessment,
    )
}

#[napi]
pub fn analyze_property(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    call(
        &input_json,
        config_json,
        immo_invest_core::analysis::analyze_property,
    )
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

#[napi]
pub fn fair_price(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    call(
        &input_json,
        config_json,
        immo_invest_core::valuation::fair_price::fair_price_analysis,
    )
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

#[napi]
pub fn personalized_score(input_json: String) -> NapiResult<String> {
    let input: immo_invest_core::scoring::score::PersonalizedScoreInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        immo_invest_core::scoring::score::personalized_score(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn adjusted_weights(profile_json: String) -> NapiResult<String> {
    let profile: immo_invest_core::scoring::weights::InvestorProfile =
        serde_json::from_str(&profile_json).map_err(to_napi_error)?;
    let weights = immo_invest_core::scoring::weights::adjusted_weights(&profile);
    serde_json::to_string(&weights).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Parse raw form fields; errors name the offending field.
#[napi]
pub fn parse_input(raw_json: String, config_json: Option<String>) -> NapiResult<String> {
    call(
        &raw_json,
        config_json,
        |raw: &immo_invest_core::input::RawPropertyInput, config| raw.parse(config),
    )
}
