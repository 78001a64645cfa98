//! Compact duration scanner.
//!
//! Turns strings like `"1y2mo3d4h"` into a [`Magnitudes`] record. The scanner
//! walks the input looking for number/suffix pairs and skips anything between
//! them, so `"1h 30m"` and `"wait 1h, then 30m"` parse identically. Repeated
//! units are last-write-wins.

use crate::error::{Result, SpanError};
use crate::magnitudes::{Magnitudes, Unit};

/// A matched number/suffix pair and how many bytes of input it covered.
struct Pair<'a> {
    number: &'a str,
    suffix: &'a str,
    len: usize,
}

/// Parse a compact duration string into a [`Magnitudes`] record.
///
/// Each field of the record comes from the rightmost pair naming its unit;
/// fields never mentioned stay absent. Suffixes are case-sensitive (`m` is
/// minutes, `mo` is months; `1H` is an unknown unit, not an hour).
///
/// # Errors
///
/// * [`SpanError::EmptyOrInvalid`] if no number/suffix pair was found at all.
/// * [`SpanError::UnknownUnit`] if a number is followed by an unrecognized
///   suffix (including no suffix: `"5"` fails with an empty unit).
/// * [`SpanError::MalformedNumber`] if a matched number does not scan as a
///   finite float (`"1.2.3h"`). The suffix is checked first, so a pair that
///   is wrong on both counts reports the unknown unit.
///
/// # Examples
///
/// ```
/// use calspan::{parse, Unit};
///
/// let m = parse("1y2mo3d4h")?;
/// assert_eq!(m.get(Unit::Years), 1.0);
/// assert_eq!(m.get(Unit::Months), 2.0);
/// assert_eq!(m.get(Unit::Days), 3.0);
/// assert_eq!(m.get(Unit::Hours), 4.0);
/// assert_eq!(m.minutes, None);
/// # Ok::<(), calspan::SpanError>(())
/// ```
pub fn parse(text: &str) -> Result<Magnitudes> {
    let mut record = Magnitudes::default();
    let mut pairs = 0usize;
    let mut pos = 0usize;

    while pos < text.len() {
        let rest = &text[pos..];
        match match_pair(rest) {
            Some(pair) => {
                let unit = Unit::from_suffix(pair.suffix)
                    .ok_or_else(|| SpanError::UnknownUnit(pair.suffix.to_string()))?;
                let value: f64 = pair
                    .number
                    .parse()
                    .ok()
                    .filter(|v: &f64| v.is_finite())
                    .ok_or_else(|| SpanError::MalformedNumber(pair.number.to_string()))?;
                record.set(unit, value);
                pairs += 1;
                pos += pair.len;
            }
            None => {
                // No pair starts here; skip one char and rescan.
                let Some(c) = rest.chars().next() else { break };
                pos += c.len_utf8();
            }
        }
    }

    if pairs == 0 {
        return Err(SpanError::EmptyOrInvalid(text.to_string()));
    }
    Ok(record)
}

/// Match a number/suffix pair at the head of `rest`, or `None` if `rest` does
/// not start with a number.
///
/// The number is an optional sign followed by digits and dots (validated
/// later by the float parser); the suffix is the maximal run of ASCII letters
/// immediately after it, plus the micro signs. An empty suffix still counts
/// as a match so the caller can report the bare number as an unknown unit.
fn match_pair(rest: &str) -> Option<Pair<'_>> {
    let bytes = rest.as_bytes();
    let mut num_end = 0usize;

    if matches!(bytes.first(), Some(b'+') | Some(b'-'))
        && matches!(bytes.get(1), Some(c) if c.is_ascii_digit() || *c == b'.')
    {
        num_end = 1;
    }
    while matches!(bytes.get(num_end), Some(c) if c.is_ascii_digit() || *c == b'.') {
        num_end += 1;
    }
    if num_end == 0 || !bytes[..num_end].iter().any(u8::is_ascii_digit) {
        return None;
    }

    let mut suffix_end = num_end;
    for c in rest[num_end..].chars() {
        if c.is_ascii_alphabetic() || c == 'µ' || c == 'μ' {
            suffix_end += c.len_utf8();
        } else {
            break;
        }
    }

    Some(Pair {
        number: &rest[..num_end],
        suffix: &rest[num_end..suffix_end],
        len: suffix_end,
    })
}

// ── Tests ───────────────────────────────────────────────────────────────────
