// Error types for the rental engines
// Covers pricing configuration loading and rule validation

use thiserror::Error;

/// Main error type for the rental engines
///
/// Raised while building a pricing table or loading rule configuration.
/// Booking and catalog failures use `RentalError` instead.
#[derive(Debug, Error)]
pub enum BusinessRulesError {
    /// A pricing rule has a negative or out-of-range value,
    /// or the same category is configured twice
    #[error("Invalid pricing rule configuration: {0}")]
    InvalidPricingRule(String),

    /// Any other configuration that fails validation checks
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The pricing file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The pricing file is not valid JSON for a rule list
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for rental engine configuration
pub type BRResult<T> = Result<T, BusinessRulesError>;
