use thiserror::Error;

use crate::sweep::SweepField;

/// Raised when a configuration leaves the model physically undefined.
/// Every variant carries the name of the offending quantity.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("{quantity} must be positive (got {value})")]
    NonPositive { quantity: &'static str, value: f64 },

    #[error("{quantity} is not finite (got {value})")]
    NonFinite { quantity: &'static str, value: f64 },

    #[error("combustion temperature {combustion_k:.1} K does not exceed ambient {ambient_k:.1} K")]
    NoTemperatureRise { combustion_k: f64, ambient_k: f64 },
}

impl DomainError {
    /// Name of the quantity that made the model undefined.
    pub fn quantity(&self) -> &'static str {
        match self {
            DomainError::NonPositive { quantity, .. } | DomainError::NonFinite { quantity, .. } => {
                quantity
            }
            DomainError::NoTemperatureRise { .. } => "combustion_temperature",
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

/// Require `value` to be finite and strictly positive.
pub(crate) fn positive(quantity: &'static str, value: f64) -> DomainResult<f64> {
    if !value.is_finite() {
        return Err(DomainError::NonFinite { quantity, value });
    }
    if value <= 0.0 {
        return Err(DomainError::NonPositive { quantity, value });
    }
    Ok(value)
}

/// Require `value` to be finite.
pub(crate) fn finite(quantity: &'static str, value: f64) -> DomainResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DomainError::NonFinite { quantity, value })
    }
}

/// A `DomainError` captured for a single sweep point.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field} = {value}: {source}")]
pub struct SweepEntryError {
    pub field: SweepField,
    pub value: f64,
    #[source]
    pub source: DomainError,
}

/// A `DomainError` captured for a single two-field grid point.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{row_field} = {row_value}, {col_field} = {col_value}: {source}")]
pub struct GridEntryError {
    pub row_field: SweepField,
    pub row_value: f64,
    pub col_field: SweepField,
    pub col_value: f64,
    #[source]
    pub source: DomainError,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizeError {
    #[error("at least one parameter range is required")]
    NoRanges,

    #[error("at most 3 parameter ranges are supported (got {0})")]
    TooManyRanges(usize),

    #[error("points per axis must be >= 2 (got {0})")]
    TooFewPoints(usize),

    #[error("range for {field} is invalid: min {min} > max {max}")]
    InvalidRange { field: SweepField, min: f64, max: f64 },

    #[error("no grid point evaluated successfully ({failed} failures)")]
    NoFeasiblePoint { failed: usize },
}
