//! Discord timestamp markup.
//!
//! Discord chat clients render `<t:{unix_seconds}:{style}>` tokens as
//! localized dates, times, or relative phrases ("in 3 hours"). This module
//! holds the style table and the token formatter.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The seven Discord timestamp display styles.
///
/// Serialized as the single-character wire codes Discord uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimestampStyle {
    /// `t` — e.g. "16:20".
    #[serde(rename = "t")]
    ShortTime,
    /// `T` — e.g. "16:20:30".
    #[serde(rename = "T")]
    LongTime,
    /// `d` — e.g. "20/04/2021".
    #[serde(rename = "d")]
    ShortDate,
    /// `D` — e.g. "20 April 2021".
    #[serde(rename = "D")]
    LongDate,
    /// `f` — e.g. "20 April 2021 16:20". Discord's default, and ours.
    #[default]
    #[serde(rename = "f")]
    ShortDateTime,
    /// `F` — e.g. "Tuesday, 20 April 2021 16:20".
    #[serde(rename = "F")]
    LongDateTime,
    /// `R` — e.g. "in 2 months".
    #[serde(rename = "R")]
    Relative,
}

impl TimestampStyle {
    /// The single-character code used inside the token.
    pub fn code(self) -> char {
        match self {
            TimestampStyle::ShortTime => 't',
            TimestampStyle::LongTime => 'T',
            TimestampStyle::ShortDate => 'd',
            TimestampStyle::LongDate => 'D',
            TimestampStyle::ShortDateTime => 'f',
            TimestampStyle::LongDateTime => 'F',
            TimestampStyle::Relative => 'R',
        }
    }
}

impl fmt::Display for TimestampStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Format a `<t:{epoch}:{style}>` token.
pub fn render(epoch_seconds: i64, style: TimestampStyle) -> String {
    format!("<t:{}:{}>", epoch_seconds, style.code())
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_style_is_short_date_time() {
        assert_eq!(TimestampStyle::default(), TimestampStyle::ShortDateTime);
        assert_eq!(TimestampStyle::default().code(), 'f');
    }

    #[test]
    fn test_render_token_shape() {
        assert_eq!(
            render(1_726_000_000, TimestampStyle::Relative),
            "<t:1726000000:R>"
        );
        assert_eq!(render(0, TimestampStyle::default()), "<t:0:f>");
        assert_eq!(render(-1, TimestampStyle::ShortTime), "<t:-1:t>");
    }

    #[test]
    fn test_codes_are_distinct() {
        let styles = [
            TimestampStyle::ShortTime,
            TimestampStyle::LongTime,
            TimestampStyle::ShortDate,
            TimestampStyle::LongDate,
            TimestampStyle::ShortDateTime,
            TimestampStyle::LongDateTime,
            TimestampStyle::Relative,
        ];
        let mut codes: Vec<char> = styles.iter().map(|s| s.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), styles.len());
    }

    #[test]
    fn test_serde_uses_wire_codes() {
        let json = serde_json::to_string(&TimestampStyle::LongDateTime).unwrap();
        assert_eq!(json, "\"F\"");
        let back: TimestampStyle = serde_json::from_str("\"R\"").unwrap();
        assert_eq!(back, TimestampStyle::Relative);
    }
}
