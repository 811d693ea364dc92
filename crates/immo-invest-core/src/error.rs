use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImmoError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Non-amortizing loan: annual payment {annual_payment} does not cover first-year interest {first_year_interest}")]
    NonAmortizingLoan {
        annual_payment: Decimal,
        first_year_interest: Decimal,
    },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ImmoError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ImmoError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ImmoError {
    fn from(e: serde_json::Error) -> Self {
        ImmoError::SerializationError(e.to_string())
    }
}
