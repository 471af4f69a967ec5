//! Error types for balance operations.
//!
//! The taxonomy follows the layers of the driver:
//!
//! - [`TransportError`]: one serial transaction failed.
//! - [`ReadError`]: one reading failed; wraps a transport or parse failure
//!   together with the name of the source it came from.
//! - [`RegistryError`]: the configured source list is unusable. This is the
//!   only error that is fatal to plugin startup.
//!
//! Transport and parse failures never escape a single reading. They are
//! converted to a [`ReadError`] at the balance session boundary, so an
//! unreachable balance cannot stop the others from being polled.

use mettler_protocol::ParseError;

/// Result type alias for balance readings.
pub type Result<T> = std::result::Result<T, ReadError>;

/// Errors raised by a single serial transaction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The port could not be opened (missing, busy or misconfigured).
    #[error("Connection to {port} failed: {message}")]
    ConnectionFailed { port: String, message: String },

    /// No response arrived within the read timeout.
    #[error("No response from {port} after {timeout_ms}ms")]
    Timeout { port: String, timeout_ms: u64 },

    /// The device or driver reported an I/O fault mid-transaction.
    #[error("I/O fault on {port}: {message}")]
    IoFault { port: String, message: String },
}

impl TransportError {
    /// Create a new connection failed error.
    pub fn connection_failed(port: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            port: port.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout(port: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            port: port.into(),
            timeout_ms,
        }
    }

    /// Create a new I/O fault error.
    pub fn io_fault(port: impl Into<String>, message: impl Into<String>) -> Self {
        Self::IoFault {
            port: port.into(),
            message: message.into(),
        }
    }

    /// Port the failed transaction was addressed to.
    pub fn port(&self) -> &str {
        match self {
            Self::ConnectionFailed { port, .. }
            | Self::Timeout { port, .. }
            | Self::IoFault { port, .. } => port,
        }
    }
}

/// Errors returned in place of a weight reading.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReadError {
    /// The serial transaction failed.
    #[error("Could not get data from {source_name}: {source}")]
    CommunicationFailed {
        source_name: String,
        #[source]
        source: TransportError,
    },

    /// The balance answered with something that is not a weight.
    #[error("Malformed response from {source_name}: {source}")]
    MalformedResponse {
        source_name: String,
        #[source]
        source: ParseError,
    },

    /// No source is registered under this name.
    #[error("Unknown source: {name}")]
    UnknownSource { name: String },
}

impl ReadError {
    /// Create a new communication failed error.
    pub fn communication_failed(source_name: impl Into<String>, source: TransportError) -> Self {
        Self::CommunicationFailed {
            source_name: source_name.into(),
            source,
        }
    }

    /// Create a new malformed response error.
    pub fn malformed_response(source_name: impl Into<String>, source: ParseError) -> Self {
        Self::MalformedResponse {
            source_name: source_name.into(),
            source,
        }
    }

    /// Create a new unknown source error.
    pub fn unknown_source(name: impl Into<String>) -> Self {
        Self::UnknownSource { name: name.into() }
    }
}

/// Errors raised while building the source registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Two configuration entries resolve to the same logical name.
    #[error("Duplicate source name: {name}")]
    DuplicateName { name: String },

    /// A configuration entry failed validation.
    #[error("Invalid configuration for {name}: {reason}")]
    InvalidConfiguration { name: String, reason: String },
}

impl RegistryError {
    /// Create a new duplicate name error.
    pub fn duplicate_name(name: impl Into<String>) -> Self {
        Self::DuplicateName { name: name.into() }
    }

    /// Create a new invalid configuration error.
    pub fn invalid_configuration(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_connection_failed_error() {
        let error = TransportError::connection_failed("COM6", "port busy");
        assert!(matches!(error, TransportError::ConnectionFailed { .. }));
        assert_eq!(error.to_string(), "Connection to COM6 failed: port busy");
        assert_eq!(error.port(), "COM6");
    }

    #[test]
    fn test_timeout_error() {
        let error = TransportError::timeout("/dev/ttyUSB0", 5000);
        assert_eq!(error.to_string(), "No response from /dev/ttyUSB0 after 5000ms");
        assert_eq!(error.port(), "/dev/ttyUSB0");
    }

    #[test]
    fn test_io_fault_error() {
        let error = TransportError::io_fault("COM1", "broken pipe");
        assert_eq!(error.to_string(), "I/O fault on COM1: broken pipe");
    }

    #[test]
    fn test_communication_failed_keeps_source() {
        let error = ReadError::communication_failed(
            "Mettler COM6",
            TransportError::timeout("COM6", 5000),
        );

        assert_eq!(
            error.to_string(),
            "Could not get data from Mettler COM6: No response from COM6 after 5000ms"
        );
        assert!(error.source().is_some());
    }

    #[test]
    fn test_malformed_response_error() {
        let error = ReadError::malformed_response("bench", ParseError::unknown_unit("xg"));
        assert_eq!(
            error.to_string(),
            "Malformed response from bench: Unknown weight unit: \"xg\""
        );
    }

    #[test]
    fn test_unknown_source_error() {
        let error = ReadError::unknown_source("nope");
        assert_eq!(error.to_string(), "Unknown source: nope");
        assert!(error.source().is_none());
    }

    #[test]
    fn test_registry_errors() {
        assert_eq!(
            RegistryError::duplicate_name("Mettler COM6").to_string(),
            "Duplicate source name: Mettler COM6"
        );
        assert_eq!(
            RegistryError::invalid_configuration("Mettler ", "port must not be empty").to_string(),
            "Invalid configuration for Mettler : port must not be empty"
        );
    }
}
