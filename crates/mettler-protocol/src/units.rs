//! Weight units and their conversion to grams.
//!
//! The balance reports the unit it is currently displaying. The driver always
//! hands grams to the host, so every reading goes through the fixed
//! multiplier table below. A unit outside the table is an error; nothing is
//! ever assumed to already be in grams.
//!
//! | Symbol | Unit | Multiplier |
//! |--------|------|------------|
//! | `g`  | gram      | 1 |
//! | `mg` | milligram | 0.001 |
//! | `kg` | kilogram  | 1000 |
//! | `oz` | ounce     | 0.0352739619 |
//! | `lb` | pound     | 0.00220462262 |

use crate::error::{ParseError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A unit the balance may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeightUnit {
    /// `g`
    #[serde(rename = "g")]
    Gram,
    /// `mg`
    #[serde(rename = "mg")]
    Milligram,
    /// `kg`
    #[serde(rename = "kg")]
    Kilogram,
    /// `oz`
    #[serde(rename = "oz")]
    Ounce,
    /// `lb`
    #[serde(rename = "lb")]
    Pound,
}

impl WeightUnit {
    /// Every supported unit.
    pub const ALL: [WeightUnit; 5] = [
        WeightUnit::Gram,
        WeightUnit::Milligram,
        WeightUnit::Kilogram,
        WeightUnit::Ounce,
        WeightUnit::Pound,
    ];

    /// Parse a unit symbol as sent by the balance.
    ///
    /// Symbols are case-sensitive.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnknownUnit`] for any symbol outside the table.
    ///
    /// # Examples
    ///
    /// ```
    /// use mettler_protocol::WeightUnit;
    ///
    /// assert_eq!(WeightUnit::from_symbol("kg").unwrap(), WeightUnit::Kilogram);
    /// assert!(WeightUnit::from_symbol("xg").is_err());
    /// ```
    pub fn from_symbol(symbol: &str) -> Result<Self> {
        match symbol {
            "g" => Ok(WeightUnit::Gram),
            "mg" => Ok(WeightUnit::Milligram),
            "kg" => Ok(WeightUnit::Kilogram),
            "oz" => Ok(WeightUnit::Ounce),
            "lb" => Ok(WeightUnit::Pound),
            other => Err(ParseError::unknown_unit(other)),
        }
    }

    /// Symbol as printed by the balance.
    #[must_use]
    pub fn symbol(&self) -> &'static str {
        match self {
            WeightUnit::Gram => "g",
            WeightUnit::Milligram => "mg",
            WeightUnit::Kilogram => "kg",
            WeightUnit::Ounce => "oz",
            WeightUnit::Pound => "lb",
        }
    }

    /// Multiplier applied to a value in this unit to obtain grams.
    #[must_use]
    pub fn grams_factor(&self) -> f64 {
        match self {
            WeightUnit::Gram => 1.0,
            WeightUnit::Milligram => 0.001,
            WeightUnit::Kilogram => 1000.0,
            WeightUnit::Ounce => 0.0352739619,
            WeightUnit::Pound => 0.00220462262,
        }
    }

    /// Convert `value` in this unit to grams.
    ///
    /// ```
    /// use mettler_protocol::WeightUnit;
    ///
    /// assert_eq!(WeightUnit::Kilogram.to_grams(18.5), 18500.0);
    /// ```
    #[must_use]
    pub fn to_grams(&self, value: f64) -> f64 {
        value * self.grams_factor()
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl std::str::FromStr for WeightUnit {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self> {
        WeightUnit::from_symbol(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("g", WeightUnit::Gram, 1.0)]
    #[case("mg", WeightUnit::Milligram, 0.001)]
    #[case("kg", WeightUnit::Kilogram, 1000.0)]
    #[case("oz", WeightUnit::Ounce, 0.0352739619)]
    #[case("lb", WeightUnit::Pound, 0.00220462262)]
    fn test_symbol_table(#[case] symbol: &str, #[case] unit: WeightUnit, #[case] factor: f64) {
        let parsed: WeightUnit = symbol.parse().unwrap();
        assert_eq!(parsed, unit);
        assert_eq!(parsed.symbol(), symbol);
        assert_eq!(parsed.grams_factor(), factor);
        assert_eq!(parsed.to_string(), symbol);
    }

    #[rstest]
    #[case("xg")]
    #[case("G")]
    #[case("KG")]
    #[case("ct")]
    #[case("")]
    fn test_unknown_symbols(#[case] symbol: &str) {
        assert_eq!(
            WeightUnit::from_symbol(symbol),
            Err(ParseError::unknown_unit(symbol))
        );
    }

    #[test]
    fn test_all_units_roundtrip_symbols() {
        for unit in WeightUnit::ALL {
            assert_eq!(WeightUnit::from_symbol(unit.symbol()).unwrap(), unit);
        }
    }
}
