use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Loading errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    // Validation errors
    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Invalid parity: {0}")]
    InvalidParity(String),
}

impl Error {
    /// Create a new invalid field error.
    pub fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
