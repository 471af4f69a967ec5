use crate::{Error, Result, constants::STABLE_STATUSES};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Serial parity mode.
///
/// Accepts the long names (`"none"`, `"odd"`, `"even"`) as well as the
/// single-letter codes used by most serial tooling (`"N"`, `"O"`, `"E"`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    #[default]
    #[serde(alias = "N", alias = "n")]
    None,
    #[serde(alias = "O", alias = "o")]
    Odd,
    #[serde(alias = "E", alias = "e")]
    Even,
}

impl Parity {
    /// Single-letter code of this parity (`N`, `O` or `E`).
    #[must_use]
    pub fn as_char(&self) -> char {
        match self {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Parity::None => write!(f, "none"),
            Parity::Odd => write!(f, "odd"),
            Parity::Even => write!(f, "even"),
        }
    }
}

impl std::str::FromStr for Parity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "n" => Ok(Parity::None),
            "odd" | "o" => Ok(Parity::Odd),
            "even" | "e" => Ok(Parity::Even),
            _ => Err(Error::InvalidParity(s.to_string())),
        }
    }
}

/// Whether a balance status code denotes a settled reading.
///
/// ```
/// use mettler_core::is_stable_status;
///
/// assert!(is_stable_status("S"));
/// assert!(is_stable_status("SD"));
/// assert!(!is_stable_status("SI"));
/// ```
#[must_use]
pub fn is_stable_status(status: &str) -> bool {
    STABLE_STATUSES.contains(&status)
}
