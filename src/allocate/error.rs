use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AllocError {
    #[error("category set is empty")]
    EmptySet,
    #[error("category index {index} out of bounds ({len} categories)")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("total budget must not be negative: {0}")]
    NegativeBudget(Decimal),
    #[error("cannot convert an amount against a zero total budget")]
    DivisionByZero,
    #[error("value is not a finite number: {0}")]
    NotFinite(f64),
    #[error("expected {expected} ratios, got {actual}")]
    RatioCountMismatch { expected: usize, actual: usize },
    #[error("invalid ratios: {0}")]
    InvalidRatios(String),
    #[error("redistribution step must be positive: {0}")]
    InvalidStep(f64),
    #[error("duplicate category name: {0}")]
    DuplicateCategory(String),
}
