//! Configuration records for balances and the plugin document.
//!
//! A [`BalanceConfig`] describes one physical balance: the serial port it is
//! attached to, the line settings and a few measurement defaults. It is built
//! once from the plugin document and never mutated afterwards.
//!
//! The plugin document ([`PluginConfig`]) is accepted as JSON or TOML:
//!
//! ```json
//! {
//!     "name": "mettler_ag204",
//!     "enabled": true,
//!     "sources": [
//!         { "port": "COM6", "meta": null }
//!     ]
//! }
//! ```
//!
//! ```toml
//! name = "mettler_ag204"
//! enabled = true
//!
//! [[sources]]
//! port = "/dev/ttyUSB0"
//! name = "left bench"
//! baud_rate = 9600
//! parity = "none"
//! ```
//!
//! Every field except `port` has a documented default; see the `default_*`
//! functions below.

use crate::{Error, Parity, Result, constants::*};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::time::Duration;

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_byte_size() -> u8 {
    DEFAULT_BYTE_SIZE
}

fn default_flow_control() -> bool {
    DEFAULT_FLOW_CONTROL
}

fn default_density() -> f64 {
    DEFAULT_DENSITY
}

fn default_verbosity() -> u8 {
    DEFAULT_VERBOSITY
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_enabled() -> bool {
    true
}

fn default_config_name() -> String {
    DEFAULT_CONFIG_NAME.to_string()
}

/// Accepts a string label and treats anything else (`null`, numbers, tables)
/// as no label at all.
fn deserialize_label<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Label {
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<Label>::deserialize(deserializer)? {
        Some(Label::Text(text)) => Some(text),
        Some(Label::Other(_)) | None => None,
    })
}

/// Configuration of a single balance.
///
/// # Examples
///
/// ```
/// use mettler_core::{BalanceConfig, Parity};
///
/// let config = BalanceConfig::new("/dev/ttyUSB0")
///     .with_name("left bench")
///     .with_parity(Parity::Even);
///
/// assert_eq!(config.baud_rate, 9600);
/// assert_eq!(config.session_name(), "Mettler /dev/ttyUSB0");
/// assert_eq!(config.logical_name(), "left bench");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceConfig {
    /// Serial port identifier (`"COM6"`, `"/dev/ttyUSB0"`).
    pub port: String,

    /// Line speed in bits per second.
    #[serde(default = "default_baud_rate", alias = "baudrate")]
    pub baud_rate: u32,

    /// Data bits per character (5-8).
    #[serde(default = "default_byte_size", alias = "bytesize")]
    pub byte_size: u8,

    /// Parity mode.
    #[serde(default)]
    pub parity: Parity,

    /// Software (XON/XOFF) flow control.
    #[serde(default = "default_flow_control", alias = "xonxoff")]
    pub flow_control: bool,

    /// Optional label. When set it becomes the logical source name.
    #[serde(
        default,
        alias = "meta",
        deserialize_with = "deserialize_label",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,

    /// Dry weight of the weighed container in grams, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_weight: Option<f64>,

    /// Density of the weighed medium (g/cm³).
    #[serde(default = "default_density")]
    pub density: f64,

    /// Logging verbosity for communication failures.
    #[serde(default = "default_verbosity")]
    pub verbosity: u8,

    /// Per-transaction read timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl BalanceConfig {
    /// Create a configuration for `port` with every other field defaulted.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            byte_size: DEFAULT_BYTE_SIZE,
            parity: Parity::None,
            flow_control: DEFAULT_FLOW_CONTROL,
            name: None,
            dry_weight: None,
            density: DEFAULT_DENSITY,
            verbosity: DEFAULT_VERBOSITY,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Set the label.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the baud rate.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the byte size.
    pub fn with_byte_size(mut self, byte_size: u8) -> Self {
        self.byte_size = byte_size;
        self
    }

    /// Set the parity.
    pub fn with_parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    /// Enable or disable XON/XOFF flow control.
    pub fn with_flow_control(mut self, enabled: bool) -> Self {
        self.flow_control = enabled;
        self
    }

    /// Set the dry weight in grams.
    pub fn with_dry_weight(mut self, grams: f64) -> Self {
        self.dry_weight = Some(grams);
        self
    }

    /// Set the medium density.
    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    /// Set the verbosity.
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set the read timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Read timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Human-readable session name, always `"Mettler <port>"`.
    #[must_use]
    pub fn session_name(&self) -> String {
        format!("{SESSION_NAME_PREFIX} {}", self.port)
    }

    /// Name under which the balance is addressed by the host.
    ///
    /// The label when one is set (and not blank), otherwise the session name.
    #[must_use]
    pub fn logical_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => self.session_name(),
        }
    }

    /// Check every field against the ranges the serial layer accepts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidField`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.port.trim().is_empty() {
            return Err(Error::invalid_field("port", "port must not be empty"));
        }

        if self.baud_rate == 0 {
            return Err(Error::invalid_field("baud_rate", "baud rate must be positive"));
        }

        if !(MIN_BYTE_SIZE..=MAX_BYTE_SIZE).contains(&self.byte_size) {
            return Err(Error::invalid_field(
                "byte_size",
                format!(
                    "byte size must be {MIN_BYTE_SIZE}-{MAX_BYTE_SIZE}, got {}",
                    self.byte_size
                ),
            ));
        }

        if !self.density.is_finite() || self.density <= 0.0 {
            return Err(Error::invalid_field(
                "density",
                format!("density must be a positive number, got {}", self.density),
            ));
        }

        if let Some(dry_weight) = self.dry_weight
            && (!dry_weight.is_finite() || dry_weight < 0.0)
        {
            return Err(Error::invalid_field(
                "dry_weight",
                format!("dry weight must be a non-negative number, got {dry_weight}"),
            ));
        }

        if self.timeout_ms == 0 {
            return Err(Error::invalid_field("timeout_ms", "timeout must be positive"));
        }

        Ok(())
    }
}

/// The plugin configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Document name.
    #[serde(default = "default_config_name")]
    pub name: String,

    /// When false the controller starts with no sources.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// One entry per balance.
    #[serde(default)]
    pub sources: Vec<BalanceConfig>,
}

impl Default for PluginConfig {
    /// The built-in document: one balance on [`DEFAULT_PORT`].
    fn default() -> Self {
        Self {
            name: default_config_name(),
            enabled: true,
            sources: vec![BalanceConfig::new(DEFAULT_PORT)],
        }
    }
}

impl PluginConfig {
    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the document is malformed or `port` is
    /// missing from a source.
    pub fn from_json_str(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Toml`] if the document is malformed or `port` is
    /// missing from a source.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Load a document from disk, choosing the format by file extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, its extension is neither
    /// `json` nor `toml`, or its content does not decode.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Self::from_json_str(&std::fs::read_to_string(path)?),
            Some("toml") => Self::from_toml_str(&std::fs::read_to_string(path)?),
            _ => Err(Error::UnsupportedFormat(path.display().to_string())),
        }
    }
}
