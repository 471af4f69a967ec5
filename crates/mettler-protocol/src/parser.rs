//! Weight response parser.
//!
//! This module turns a raw response line into a [`ParsedReading`].
//!
//! # Response Format
//!
//! A weight response is whitespace-separated and comes in two shapes:
//!
//! ```text
//! S      18.5 g          3 tokens: status, value, unit
//! S D    18.5 g          4 tokens: status, qualifier, value, unit
//! ```
//!
//! In the 4-token shape the status is the first token and the qualifier is
//! dropped (`"S" "D"` reports `"S"`). The parser passes the status
//! through without acting on it; whether a reading counts as settled is up to
//! the caller (see [`ParsedReading::is_stable`]).
//!
//! Error responses such as `ES` or `S I` have fewer tokens and are rejected
//! as [`ParseError::UnexpectedFormat`].
//!
//! # Examples
//!
//! ```
//! use mettler_protocol::{ResponseParser, WeightUnit};
//!
//! let reading = ResponseParser::parse("S      18.5 g").unwrap();
//! assert_eq!(reading.status, "S");
//! assert_eq!(reading.weight_value, 18.5);
//! assert_eq!(reading.unit, WeightUnit::Gram);
//! assert_eq!(reading.grams(), 18.5);
//!
//! let reading = ResponseParser::parse("S 18.5 kg").unwrap();
//! assert_eq!(reading.grams(), 18500.0);
//! ```

use crate::error::{ParseError, Result};
use crate::units::WeightUnit;
use mettler_core::is_stable_status;
use serde::{Deserialize, Serialize};

/// A successfully parsed weight response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedReading {
    /// Status code as reported by the balance.
    pub status: String,

    /// Numeric value in the reported unit.
    pub weight_value: f64,

    /// Reported unit.
    pub unit: WeightUnit,
}

impl ParsedReading {
    /// Value converted to grams.
    #[must_use]
    pub fn grams(&self) -> f64 {
        self.unit.to_grams(self.weight_value)
    }

    /// Whether the status code denotes a settled reading.
    #[must_use]
    pub fn is_stable(&self) -> bool {
        is_stable_status(&self.status)
    }
}

/// Parser for weight response lines.
pub struct ResponseParser;

impl ResponseParser {
    /// Parse one response line.
    ///
    /// Leading and trailing whitespace (including a stray terminator) is
    /// ignored by tokenization.
    ///
    /// # Errors
    ///
    /// - [`ParseError::UnexpectedFormat`] if the line does not have 3 or 4 tokens
    /// - [`ParseError::InvalidNumber`] if the value is not a finite number
    /// - [`ParseError::UnknownUnit`] if the unit is not in the conversion table
    ///
    /// ```
    /// use mettler_protocol::{ParseError, ResponseParser};
    ///
    /// assert!(matches!(
    ///     ResponseParser::parse("ES"),
    ///     Err(ParseError::UnexpectedFormat { tokens: 1, .. })
    /// ));
    /// assert!(matches!(
    ///     ResponseParser::parse("S 18.5 xg"),
    ///     Err(ParseError::UnknownUnit { .. })
    /// ));
    /// ```
    pub fn parse(raw: &str) -> Result<ParsedReading> {
        let tokens: Vec<&str> = raw.split_whitespace().collect();

        let (status, value, unit) = match tokens.as_slice() {
            [status, value, unit] => (status.to_string(), *value, *unit),
            [status, _qualifier, value, unit] => (status.to_string(), *value, *unit),
            _ => return Err(ParseError::unexpected_format(tokens.len(), raw)),
        };

        let weight_value = Self::parse_value(value)?;
        let unit = WeightUnit::from_symbol(unit)?;

        Ok(ParsedReading {
            status,
            weight_value,
            unit,
        })
    }

    /// Parse a response line straight to grams.
    ///
    /// # Errors
    ///
    /// Same as [`parse`](Self::parse).
    pub fn parse_grams(raw: &str) -> Result<f64> {
        Self::parse(raw).map(|reading| reading.grams())
    }

    fn parse_value(token: &str) -> Result<f64> {
        match token.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(ParseError::invalid_number(token)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_three_tokens() {
        let reading = ResponseParser::parse("S      18.5 g").unwrap();

        assert_eq!(reading.status, "S");
        assert_eq!(reading.weight_value, 18.5);
        assert_eq!(reading.unit, WeightUnit::Gram);
        assert_eq!(reading.grams(), 18.5);
        assert!(reading.is_stable());
    }

    #[test]
    fn test_parse_four_tokens_keeps_leading_status() {
        let reading = ResponseParser::parse("S D     0.0123 kg").unwrap();

        assert_eq!(reading.status, "S");
        assert_eq!(reading.weight_value, 0.0123);
        assert_eq!(reading.unit, WeightUnit::Kilogram);
        assert!((reading.grams() - 12.3).abs() < 1e-9);
        assert!(reading.is_stable());
    }

    #[test]
    fn test_parse_four_tokens_ignores_qualifier() {
        let reading = ResponseParser::parse("SD X 3.5 g").unwrap();

        assert_eq!(reading.status, "SD");
        assert_eq!(reading.weight_value, 3.5);
    }

    #[test]
    fn test_parse_transient_status_passes_through() {
        let reading = ResponseParser::parse("SI   203.4467 g").unwrap();

        assert_eq!(reading.status, "SI");
        assert!(!reading.is_stable());
    }

    #[test]
    fn test_parse_kilograms() {
        assert_eq!(ResponseParser::parse_grams("S 18.5 kg").unwrap(), 18500.0);
    }

    #[test]
    fn test_parse_negative_value() {
        let reading = ResponseParser::parse("S     -0.0021 g").unwrap();
        assert_eq!(reading.weight_value, -0.0021);
    }

    #[test]
    fn test_parse_ignores_surrounding_whitespace() {
        let reading = ResponseParser::parse("  S   18.5 g \r\n").unwrap();
        assert_eq!(reading.grams(), 18.5);
    }

    #[rstest]
    #[case("", 0)]
    #[case("ES", 1)]
    #[case("S I", 2)]
    #[case("S D 1 2 g", 5)]
    #[case("S D x 18.5 g extra", 6)]
    fn test_parse_unexpected_token_count(#[case] input: &str, #[case] tokens: usize) {
        assert_eq!(
            ResponseParser::parse(input),
            Err(ParseError::unexpected_format(tokens, input))
        );
    }

    #[rstest]
    #[case("S abc g", "abc")]
    #[case("S 18,5 g", "18,5")]
    #[case("S NaN g", "NaN")]
    #[case("S inf g", "inf")]
    #[case("S D -- g", "--")]
    fn test_parse_invalid_number(#[case] input: &str, #[case] value: &str) {
        assert_eq!(
            ResponseParser::parse(input),
            Err(ParseError::invalid_number(value))
        );
    }

    #[test]
    fn test_parse_unknown_unit_never_defaults_to_grams() {
        assert_eq!(
            ResponseParser::parse("S 18.5 xg"),
            Err(ParseError::unknown_unit("xg"))
        );
    }

    #[test]
    fn test_invalid_number_reported_before_unit() {
        assert!(matches!(
            ResponseParser::parse("S abc xg"),
            Err(ParseError::InvalidNumber { .. })
        ));
    }
}
