pub mod config;
pub mod error;
pub mod input;
pub mod property;
pub mod types;

#[cfg(feature = "projection")]
pub mod projection;

#[cfg(feature = "projection")]
pub mod analysis;

#[cfg(feature = "projection")]
pub mod assessment;

#[cfg(feature = "scoring")]
pub mod scoring;

#[cfg(feature = "valuation")]
pub mod valuation;

pub use config::EngineConfig;
pub use error::ImmoError;
pub use types::*;

/// Standard result type for all immo-invest operations
pub type ImmoResult<T> = Result<T, ImmoError>;
