//! Error types for analytics operations

use crate::error::AppError;

/// Result type for analytics operations
pub type AnalyticsResult<T> = std::result::Result<T, AnalyticsError>;

/// Errors that can occur in analytics operations
///
/// Empty or short samples are not errors: they surface as absent fields.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// Input that cannot be read as a numeric sequence (NaN, infinities)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unknown Nelson rule id
    #[error("Unknown rule: {0}")]
    UnknownRule(u8),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl From<AnalyticsError> for AppError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::InvalidInput(_) | AnalyticsError::UnknownRule(_) => {
                AppError::Validation(err.to_string())
            }
            AnalyticsError::InvalidConfiguration(msg) => AppError::Configuration(msg),
        }
    }
}
