//! Descriptive types for connected balances.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Identity and configuration summary of one balance.
///
/// The model and serial number are queried from the device and are `None`
/// when it does not answer or answers without a quoted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceInfo {
    /// Session name, `"Mettler <port>"`.
    pub name: String,

    /// Serial port.
    pub port: String,

    /// Model string reported by the `I2` command.
    pub model: Option<String>,

    /// Serial number reported by the `I4` command.
    pub serial_number: Option<String>,

    /// Configured tare (dry) weight in grams.
    pub dry_weight: Option<f64>,

    /// Configured fluid density in g/mL.
    pub density: f64,

    /// When the session was created.
    pub connected_at: DateTime<Local>,
}

impl BalanceInfo {
    /// Whether both identity queries produced a value.
    pub fn is_identified(&self) -> bool {
        self.model.is_some() && self.serial_number.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> BalanceInfo {
        BalanceInfo {
            name: "Mettler COM6".to_string(),
            port: "COM6".to_string(),
            model: Some("AG204".to_string()),
            serial_number: None,
            dry_weight: Some(12.5),
            density: 0.963,
            connected_at: Local::now(),
        }
    }

    #[test]
    fn test_is_identified() {
        let mut info = info();
        assert!(!info.is_identified());

        info.serial_number = Some("1113172519".to_string());
        assert!(info.is_identified());
    }

    #[test]
    fn test_serializes_missing_identity_as_null() {
        let json = serde_json::to_value(info()).unwrap();

        assert_eq!(json["name"], "Mettler COM6");
        assert_eq!(json["model"], "AG204");
        assert!(json["serial_number"].is_null());
        assert_eq!(json["density"], 0.963);
    }
}
