//! Balance command set.
//!
//! Only a handful of commands matter to the driver: the two weight requests
//! and the two identity queries. Anything else the caller wants to send is
//! carried through unchanged as [`Command::Custom`].

use mettler_core::constants::{
    CMD_MODEL_IDENTITY, CMD_SERIAL_IDENTITY, CMD_WEIGHT_IMMEDIATE, CMD_WEIGHT_STABLE,
};
use std::fmt;

/// A command token, without line terminator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Command {
    /// `SI`: current weight, stable or not.
    #[default]
    WeightImmediate,
    /// `S`: next stable weight.
    WeightStable,
    /// `I2`: model designation.
    ModelIdentity,
    /// `I4`: serial number.
    SerialIdentity,
    /// Any other token, sent verbatim.
    Custom(String),
}

impl Command {
    /// Parse a command token. Known tokens map to their variant, anything
    /// else becomes [`Command::Custom`].
    ///
    /// ```
    /// use mettler_protocol::Command;
    ///
    /// assert_eq!(Command::parse("SI"), Command::WeightImmediate);
    /// assert_eq!(Command::parse(" I4 "), Command::SerialIdentity);
    /// assert_eq!(Command::parse("Z"), Command::Custom("Z".to_string()));
    /// ```
    pub fn parse(token: &str) -> Self {
        match token.trim() {
            CMD_WEIGHT_IMMEDIATE => Command::WeightImmediate,
            CMD_WEIGHT_STABLE => Command::WeightStable,
            CMD_MODEL_IDENTITY => Command::ModelIdentity,
            CMD_SERIAL_IDENTITY => Command::SerialIdentity,
            other => Command::Custom(other.to_string()),
        }
    }

    /// Token as written to the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Command::WeightImmediate => CMD_WEIGHT_IMMEDIATE,
            Command::WeightStable => CMD_WEIGHT_STABLE,
            Command::ModelIdentity => CMD_MODEL_IDENTITY,
            Command::SerialIdentity => CMD_SERIAL_IDENTITY,
            Command::Custom(token) => token,
        }
    }

    /// Whether the balance answers this command with a weight line.
    #[must_use]
    pub fn is_weight_request(&self) -> bool {
        matches!(self, Command::WeightImmediate | Command::WeightStable)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Command {
    fn from(token: &str) -> Self {
        Command::parse(token)
    }
}
