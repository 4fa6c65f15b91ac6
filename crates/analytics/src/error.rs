use core_types::CoreError;
use thiserror::Error;

/// Structural misuse of the analytics API.
///
/// Numeric degeneracies (zero variance, log of a non-positive price, empty
/// series) are never errors; they surface as missing values in the output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Invalid panel data: {0}")]
    Core(#[from] CoreError),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl AnalyticsError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        AnalyticsError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
