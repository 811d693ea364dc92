//! Parse-and-validate boundary between raw form fields and typed inputs.
//!
//! Form values arrive as strings in whatever notation the user typed
//! ("300.000", "3,8", " 950 "). Everything is converted to `Decimal` here so
//! that no half-parsed value ever reaches a calculation.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::ImmoError;
use crate::property::{LoanTerms, PropertyFinancials};
use crate::ImmoResult;

/// Raw, untyped form input as delivered by a UI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPropertyInput {
    pub purchase_price: Option<String>,
    pub monthly_rent: Option<String>,
    pub monthly_service_charge: Option<String>,
    pub living_area_sqm: Option<String>,
    pub construction_year: Option<String>,
    pub equity: Option<String>,
    pub interest_rate_pct: Option<String>,
    pub amortization_rate_pct: Option<String>,
}

/// Typed result of a successful parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedInput {
    pub financials: PropertyFinancials,
    pub loan: LoanTerms,
}

impl RawPropertyInput {
    /// Parse every field, then validate the typed structures.
    ///
    /// Optional loan fields fall back to the configured defaults; equity
    /// defaults to 0 (full financing).
    pub fn parse(&self, config: &EngineConfig) -> ImmoResult<ParsedInput> {
        let financials = PropertyFinancials {
            purchase_price: required("purchase_price", &self.purchase_price)?,
            monthly_rent: required("monthly_rent", &self.monthly_rent)?,
            monthly_service_charge: optional("monthly_service_charge", &self.monthly_service_charge)?
                .unwrap_or(Decimal::ZERO),
            living_area_sqm: optional("living_area_sqm", &self.living_area_sqm)?,
            construction_year: parse_year(&self.construction_year)?,
        };
        financials.validate()?;

        let loan = LoanTerms {
            equity: optional("equity", &self.equity)?.unwrap_or(Decimal::ZERO),
            interest_rate_pct: optional("interest_rate_pct", &self.interest_rate_pct)?
                .unwrap_or(config.default_interest_rate_pct),
            amortization_rate_pct: optional("amortization_rate_pct", &self.amortization_rate_pct)?
                .unwrap_or(config.default_amortization_rate_pct),
        };
        loan.validate(&financials)?;

        Ok(ParsedInput { financials, loan })
    }
}

fn required(field: &str, raw: &Option<String>) -> ImmoResult<Decimal> {
    optional(field, raw)?.ok_or_else(|| ImmoError::invalid(field, "Value is required"))
}

fn optional(field: &str, raw: &Option<String>) -> ImmoResult<Option<Decimal>> {
    let text = match raw.as_deref().map(str::trim) {
        None | Some("") => return Ok(None),
        Some(t) => t,
    };
    let value = parse_number(text).ok_or_else(|| {
        ImmoError::invalid(field, format!("'{text}' is not a valid number"))
    })?;
    if value < Decimal::ZERO {
        return Err(ImmoError::invalid(field, "Value cannot be negative"));
    }
    Ok(Some(value))
}

fn parse_year(raw: &Option<String>) -> ImmoResult<Option<u16>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(t) => t.parse::<u16>().map(Some).map_err(|_| {
            ImmoError::invalid("construction_year", format!("'{t}' is not a valid year"))
        }),
    }
}

/// Parse a number written with either `.` or `,` as decimal separator and
/// optional thousands grouping in the other one.
///
/// A lone separator followed by exactly three digits is read as grouping
/// ("300.000" → 300000), anything else as a decimal point ("3,8" → 3.8).
pub fn parse_number(text: &str) -> Option<Decimal> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '€' && *c != '%' && *c != '\'')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let dots = cleaned.matches('.').count();
    let commas = cleaned.matches(',').count();

    let normalized = match (dots, commas) {
        (0, 0) => cleaned,
        (_, 0) => single_separator(&cleaned, '.', dots)?,
        (0, _) => single_separator(&cleaned, ',', commas)?,
        _ => {
            // Both present: whichever comes last is the decimal separator.
            let last_dot = cleaned.rfind('.')?;
            let last_comma = cleaned.rfind(',')?;
            let (group, decimal) = if last_comma > last_dot {
                ('.', ',')
            } else {
                (',', '.')
            };
            if cleaned.matches(decimal).count() != 1 {
                return None;
            }
            cleaned.replace(group, "").replace(decimal, ".")
        }
    };

    // Reject anything Decimal would not take verbatim (NaN, inf, stray signs).
    if !normalized
        .chars()
        .enumerate()
        .all(|(i, c)| c.is_ascii_digit() || c == '.' || (c == '-' && i == 0))
    {
        return None;
    }
    Decimal::from_str(&normalized).ok()
}

fn single_separator(text: &str, sep: char, count: usize) -> Option<String> {
    if count > 1 {
        // Only grouping can repeat: 1.250.000
        let mut parts = text.split(sep);
        let head = parts.next()?;
        if head.is_empty() || head.trim_start_matches('-').len() > 3 {
            return None;
        }
        let mut out = head.to_string();
        for p in parts {
            if p.len() != 3 {
                return None;
            }
            out.push_str(p);
        }
        return Some(out);
    }
    let (head, tail) = text.split_once(sep)?;
    let head_digits = head.trim_start_matches('-');
    if tail.len() == 3 && !head_digits.is_empty() && head_digits != "0" {
        Some(format!("{head}{tail}"))
    } else {
        Some(format!("{head}.{tail}"))
    }
}
