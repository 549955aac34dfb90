use telnet_client::TelnetError;
use thiserror::Error;

/// High-level API errors for Oppo operations
///
/// This enum provides domain-specific error types that abstract away the
/// underlying telnet transport and give meaningful error information for the
/// common failure scenarios when controlling an Oppo player.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network communication error
    ///
    /// The device refused the connection, was unreachable, timed out, or the
    /// socket failed mid-exchange.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Response parsing error
    ///
    /// The device answered, but the response could not be decoded or did not
    /// carry the value the query asked for.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Invalid parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Type alias for results that can return an ApiError
pub type Result<T> = std::result::Result<T, ApiError>;

impl From<TelnetError> for ApiError {
    fn from(error: TelnetError) -> Self {
        match error {
            TelnetError::Decode(e) => ApiError::ParseError(e.to_string()),
            other => ApiError::NetworkError(other.to_string()),
        }
    }
}

/// Validation errors raised while building a command
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Parameter '{parameter}' value '{value}' is out of range ({min}..={max})")]
    RangeError {
        parameter: String,
        value: String,
        min: String,
        max: String,
    },
}

impl ValidationError {
    pub fn range_error(
        parameter: &str,
        min: impl std::fmt::Display,
        max: impl std::fmt::Display,
        value: impl std::fmt::Display,
    ) -> Self {
        Self::RangeError {
            parameter: parameter.to_string(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(validation_error: ValidationError) -> Self {
        ApiError::InvalidParameter(validation_error.to_string())
    }
}
