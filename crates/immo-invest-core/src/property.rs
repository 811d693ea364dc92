use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ImmoError;
use crate::types::{Money, Percent};
use crate::ImmoResult;

/// Upper bound for every amount the engine accepts (one trillion).
pub const MAX_AMOUNT: Money = dec!(1000000000000);

/// Upper bound for interest and amortization rates, % p.a.
pub const MAX_RATE_PCT: Percent = dec!(100);

/// Property figures an analysis starts from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyFinancials {
    /// Purchase price (Kaufpreis)
    pub purchase_price: Money,
    /// Monthly cold rent (Kaltmiete)
    pub monthly_rent: Money,
    /// Monthly service charge (Hausgeld); only part of it is non-recoverable
    #[serde(default)]
    pub monthly_service_charge: Money,
    /// Living area in m²
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub living_area_sqm: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub construction_year: Option<u16>,
}

/// Loan parameters for an annuity loan quoted as interest + initial amortization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Equity brought in (Eigenkapital)
    pub equity: Money,
    /// Nominal interest rate, % p.a.
    pub interest_rate_pct: Percent,
    /// Initial amortization rate (Tilgung), % p.a. of the financed amount
    pub amortization_rate_pct: Percent,
}

impl PropertyFinancials {
    pub fn validate(&self) -> ImmoResult<()> {
        if self.purchase_price <= Decimal::ZERO {
            return Err(ImmoError::invalid(
                "purchase_price",
                "Purchase price must be positive",
            ));
        }
        if self.monthly_rent < Decimal::ZERO {
            return Err(ImmoError::invalid(
                "monthly_rent",
                "Monthly rent cannot be negative",
            ));
        }
        if self.monthly_service_charge < Decimal::ZERO {
            return Err(ImmoError::invalid(
                "monthly_service_charge",
                "Service charge cannot be negative",
            ));
        }
        if let Some(area) = self.living_area_sqm {
            if area < Decimal::ONE || area > MAX_AMOUNT {
                return Err(ImmoError::invalid(
                    "living_area_sqm",
                    "Living area must lie between 1 m² and 10^12 m²",
                ));
            }
        }
        if self.purchase_price < Decimal::ONE {
            return Err(ImmoError::invalid(
                "purchase_price",
                "Purchase price must be at least 1",
            ));
        }
        for (field, value) in [
            ("purchase_price", self.purchase_price),
            ("monthly_rent", self.monthly_rent),
            ("monthly_service_charge", self.monthly_service_charge),
        ] {
            check_max_amount(field, value)?;
        }
        Ok(())
    }

    pub fn annual_rent(&self) -> Money {
        self.monthly_rent * Decimal::from(12)
    }
}

impl LoanTerms {
    pub fn new(equity: Money, interest_rate_pct: Percent, amortization_rate_pct: Percent) -> Self {
        Self {
            equity,
            interest_rate_pct,
            amortization_rate_pct,
        }
    }

    /// Checks the terms against the property they finance.
    pub fn validate(&self, financials: &PropertyFinancials) -> ImmoResult<()> {
        if self.equity < Decimal::ZERO {
            return Err(ImmoError::invalid("equity", "Equity cannot be negative"));
        }
        if self.equity > financials.purchase_price {
            return Err(ImmoError::invalid(
                "equity",
                "Equity cannot exceed the purchase price",
            ));
        }
        if self.interest_rate_pct < Decimal::ZERO {
            return Err(ImmoError::invalid(
                "interest_rate_pct",
                "Interest rate cannot be negative",
            ));
        }
        if self.amortization_rate_pct < Decimal::ZERO {
            return Err(ImmoError::invalid(
                "amortization_rate_pct",
                "Amortization rate cannot be negative",
            ));
        }
        for (field, value) in [
            ("interest_rate_pct", self.interest_rate_pct),
            ("amortization_rate_pct", self.amortization_rate_pct),
        ] {
            if value > MAX_RATE_PCT {
                return Err(ImmoError::invalid(
                    field,
                    format!("Rate cannot exceed {MAX_RATE_PCT}% p.a."),
                ));
            }
        }
        Ok(())
    }

    pub fn financed_amount(&self, financials: &PropertyFinancials) -> Money {
        financials.purchase_price - self.equity
    }

    /// Interest plus amortization, % p.a.
    pub fn total_rate_pct(&self) -> Percent {
        self.interest_rate_pct + self.amortization_rate_pct
    }

    pub fn with_equity(&self, equity: Money) -> Self {
        Self {
            equity,
            ..self.clone()
        }
    }

    pub fn with_interest_rate(&self, interest_rate_pct: Percent) -> Self {
        Self {
            interest_rate_pct,
            ..self.clone()
        }
    }
}

/// Energy efficiency class from the energy certificate (Energieausweis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EnergyClass {
    APlus,
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
}

impl EnergyClass {
    /// G and H: heavy retrofit obligations ahead.
    pub fn is_poor(self) -> bool {
        matches!(self, EnergyClass::G | EnergyClass::H)
    }
}

impl fmt::Display for EnergyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EnergyClass::APlus => "A+",
            EnergyClass::A => "A",
            EnergyClass::B => "B",
            EnergyClass::C => "C",
            EnergyClass::D => "D",
            EnergyClass::E => "E",
            EnergyClass::F => "F",
            EnergyClass::G => "G",
            EnergyClass::H => "H",
        };
        f.write_str(label)
    }
}

impl FromStr for EnergyClass {
    type Err = ImmoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A+" => Ok(EnergyClass::APlus),
            "A" => Ok(EnergyClass::A),
            "B" => Ok(EnergyClass::B),
            "C" => Ok(EnergyClass::C),
            "D" => Ok(EnergyClass::D),
            "E" => Ok(EnergyClass::E),
            "F" => Ok(EnergyClass::F),
            "G" => Ok(EnergyClass::G),
            "H" => Ok(EnergyClass::H),
            other => Err(ImmoError::invalid(
                "energy_class",
                format!("Unknown energy class '{other}', expected A+ or A to H"),
            )),
        }
    }
}

impl TryFrom<String> for EnergyClass {
    type Error = ImmoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EnergyClass> for String {
    fn from(class: EnergyClass) -> Self {
        class.to_string()
    }
}

/// Listing facts beyond the numbers, used by the quick check and no-go rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_class: Option<EnergyClass>,
    /// Free-text object type from the listing, e.g. "Einfamilienhaus"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Land held on a ground lease (Erbpacht) rather than owned
    #[serde(default)]
    pub ground_lease: bool,
    /// Rent-controlled under a social housing subsidy (Sozialbindung)
    #[serde(default)]
    pub social_housing: bool,
}

fn check_max_amount(field: &str, value: Money) -> ImmoResult<()> {
    if value > MAX_AMOUNT {
        return Err(ImmoError::invalid(
            field,
            format!("Amount cannot exceed {MAX_AMOUNT}"),
        ));
    }
    Ok(())
}
