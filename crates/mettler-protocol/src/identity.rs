//! Identity response extraction.
//!
//! The identity commands answer with the requested value in double quotes:
//!
//! ```text
//! I2 A "AG204 Max 210g"
//! I4 A "1113172519"
//! ```
//!
//! The quoted text is matched greedily, from the first quote to the last one,
//! so embedded quotes stay part of the value.

use regex::Regex;
use std::sync::LazyLock;

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(.+)""#).expect("quoted value pattern is valid"));

/// Extract the quoted value from an identity response.
///
/// Returns `None` when the response carries no non-empty quoted value.
///
/// # Examples
///
/// ```
/// use mettler_protocol::extract_quoted;
///
/// assert_eq!(
///     extract_quoted(r#"I2 A "AG204 Max 210g""#).as_deref(),
///     Some("AG204 Max 210g")
/// );
/// assert_eq!(extract_quoted("I2 I"), None);
/// ```
#[must_use]
pub fn extract_quoted(response: &str) -> Option<String> {
    QUOTED
        .captures(response)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str().to_string())
}
