use rust_decimal::Decimal;
use shared_types::ModelError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("Markup percent must not be negative (got {0})")]
    NegativePercent(Decimal),

    #[error("Fixed surcharge must not be negative (got {0})")]
    NegativeFixedAdd(Decimal),

    #[error("Random spread must be between 0 and {max} (got {spread})")]
    InvalidSpread { spread: Decimal, max: Decimal },

    #[error("Rounding step must be one of 1, 10, 50, 100 (got {0})")]
    InvalidRoundingStep(Decimal),

    #[error("Price of '{name}' is out of range after markup")]
    PriceOverflow { name: String },

    #[error(transparent)]
    Item(#[from] ModelError),
}
