//! Error types for response parsing.
//!
//! A [`ParseError`] always describes a single unusable response line. It is
//! local to one reading and never affects other balances.

/// Result type alias for parsing operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors that can occur while turning a response line into a reading.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// The line does not have the `[status] status value unit` shape.
    #[error("Unexpected response format ({tokens} tokens): {raw:?}")]
    UnexpectedFormat { tokens: usize, raw: String },

    /// The value token is not a finite number.
    #[error("Invalid weight value: {value:?}")]
    InvalidNumber { value: String },

    /// The unit token is not one the balance is known to report.
    #[error("Unknown weight unit: {unit:?}")]
    UnknownUnit { unit: String },
}

impl ParseError {
    /// Create a new unexpected format error.
    pub fn unexpected_format(tokens: usize, raw: impl Into<String>) -> Self {
        Self::UnexpectedFormat {
            tokens,
            raw: raw.into(),
        }
    }

    /// Create a new invalid number error.
    pub fn invalid_number(value: impl Into<String>) -> Self {
        Self::InvalidNumber {
            value: value.into(),
        }
    }

    /// Create a new unknown unit error.
    pub fn unknown_unit(unit: impl Into<String>) -> Self {
        Self::UnknownUnit { unit: unit.into() }
    }
}
