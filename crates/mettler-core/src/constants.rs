//! Core constants for the Mettler-Toledo AG balance driver.
//!
//! This module collects the protocol-level and configuration-level constants
//! shared by the protocol parser, the serial transport and the plugin
//! controller.
//!
//! # Wire Format
//!
//! The AG series speaks a line-oriented ASCII dialect of the MT-SICS command
//! set. Every command and every response is a single line terminated by
//! carriage-return/line-feed:
//!
//! ```text
//! host    -> balance:  SI<CR><LF>
//! balance -> host:     S      18.5 g<CR><LF>
//! ```
//!
//! # Usage
//!
//! ```
//! use mettler_core::constants::*;
//!
//! assert_eq!(LINE_TERMINATOR, b"\r\n");
//! assert_eq!(CMD_WEIGHT_IMMEDIATE, "SI");
//! assert_eq!(DEFAULT_TIMEOUT_MS, 5000);
//! ```

// ============================================================================
// Message Framing
// ============================================================================

/// Line terminator appended to every command and ending every response.
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

/// Carriage return byte.
pub const CR: u8 = b'\r';

/// Line feed byte. A response line is complete once this byte arrives.
pub const LF: u8 = b'\n';

// ============================================================================
// Command Set
// ============================================================================

/// Send the current weight immediately, stable or not.
pub const CMD_WEIGHT_IMMEDIATE: &str = "SI";

/// Send the next stable weight.
pub const CMD_WEIGHT_STABLE: &str = "S";

/// Query the balance type/model designation.
///
/// The balance answers with the model quoted, e.g. `I2 A "AG204 Max 210g"`.
pub const CMD_MODEL_IDENTITY: &str = "I2";

/// Query the balance serial number.
///
/// The balance answers with the serial quoted, e.g. `I4 A "1113172519"`.
pub const CMD_SERIAL_IDENTITY: &str = "I4";

// ============================================================================
// Status Codes
// ============================================================================

/// Status codes reported by the balance for a settled reading.
///
/// `S` is a stable weight and `SD` a stable dynamic weight. In the 4-token
/// response shape only the leading token is the status. Anything else is
/// treated as transient by [`is_stable_status`](crate::is_stable_status).
pub const STABLE_STATUSES: &[&str] = &["S", "SD"];

// ============================================================================
// Serial Defaults
// ============================================================================

/// Default baud rate of the AG series RS-232 interface.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default number of data bits per character.
pub const DEFAULT_BYTE_SIZE: u8 = 8;

/// Smallest byte size accepted by the serial layer.
pub const MIN_BYTE_SIZE: u8 = 5;

/// Largest byte size accepted by the serial layer.
pub const MAX_BYTE_SIZE: u8 = 8;

/// Software (XON/XOFF) flow control is enabled by default.
pub const DEFAULT_FLOW_CONTROL: bool = true;

/// Default per-transaction read timeout (milliseconds).
///
/// A transaction that has not produced a complete line within this bound
/// fails with a timeout.
///
/// # Value: 5000ms (5 seconds)
///
/// ```
/// use mettler_core::constants::DEFAULT_TIMEOUT_MS;
/// use std::time::Duration;
///
/// assert_eq!(Duration::from_millis(DEFAULT_TIMEOUT_MS).as_secs(), 5);
/// ```
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

// ============================================================================
// Measurement Defaults
// ============================================================================

/// Default density of the weighed medium (g/cm³).
pub const DEFAULT_DENSITY: f64 = 0.963;

/// Default verbosity. At `0` communication failures are logged at debug level
/// only.
pub const DEFAULT_VERBOSITY: u8 = 1;

// ============================================================================
// Plugin Identity
// ============================================================================

/// Prefix of every balance session name (`"Mettler COM6"`).
pub const SESSION_NAME_PREFIX: &str = "Mettler";

/// Name under which the controller registers with the host.
pub const PLUGIN_NAME: &str = "mettler-ag204";

/// Human-readable plugin description.
pub const PLUGIN_DESCRIPTION: &str = "Gets weight data from Mettler-Toledo AG204 scale.";

/// Name of the default configuration document.
pub const DEFAULT_CONFIG_NAME: &str = "mettler_ag204";

/// Port used by the built-in default configuration.
pub const DEFAULT_PORT: &str = "COM6";
