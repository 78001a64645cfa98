//! The ten-field magnitude record and its unit taxonomy.
//!
//! A [`Magnitudes`] value holds one optional signed magnitude per unit, years
//! down to nanoseconds. Absent fields read as zero. Fields are **not**
//! normalized against each other (1500 milliseconds stays 1500 milliseconds);
//! only the engine's explicit anchored balancing converts between units.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpanError};

/// Largest representable total of the day-and-smaller fields, in nanoseconds
/// (2^53 seconds).
const MAX_TIME_NS: f64 = 9.007_199_254_740_992e24;

/// Largest magnitude accepted for the calendar fields (years, months, weeks).
const MAX_CALENDAR_UNIT: f64 = 4_294_967_296.0;

// ── Unit ────────────────────────────────────────────────────────────────────

/// One of the ten span units, ordered from least to most significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl Unit {
    /// All units, most significant first.
    pub const DESCENDING: [Unit; 10] = [
        Unit::Years,
        Unit::Months,
        Unit::Weeks,
        Unit::Days,
        Unit::Hours,
        Unit::Minutes,
        Unit::Seconds,
        Unit::Milliseconds,
        Unit::Microseconds,
        Unit::Nanoseconds,
    ];

    /// Resolve a parser suffix to its unit. Case-sensitive; `µs` (U+00B5) and
    /// `μs` (U+03BC) are accepted alongside `us`.
    pub fn from_suffix(suffix: &str) -> Option<Unit> {
        match suffix {
            "ns" => Some(Unit::Nanoseconds),
            "us" | "µs" | "μs" => Some(Unit::Microseconds),
            "ms" => Some(Unit::Milliseconds),
            "s" => Some(Unit::Seconds),
            "m" => Some(Unit::Minutes),
            "h" => Some(Unit::Hours),
            "d" => Some(Unit::Days),
            "w" => Some(Unit::Weeks),
            "mo" => Some(Unit::Months),
            "y" => Some(Unit::Years),
            _ => None,
        }
    }

    /// The canonical suffix for this unit (the inverse of [`Unit::from_suffix`]).
    pub fn suffix(self) -> &'static str {
        match self {
            Unit::Nanoseconds => "ns",
            Unit::Microseconds => "us",
            Unit::Milliseconds => "ms",
            Unit::Seconds => "s",
            Unit::Minutes => "m",
            Unit::Hours => "h",
            Unit::Days => "d",
            Unit::Weeks => "w",
            Unit::Months => "mo",
            Unit::Years => "y",
        }
    }

    /// Singular English name ("year", "minute", ...). All plurals are regular.
    pub fn singular(self) -> &'static str {
        match self {
            Unit::Nanoseconds => "nanosecond",
            Unit::Microseconds => "microsecond",
            Unit::Milliseconds => "millisecond",
            Unit::Seconds => "second",
            Unit::Minutes => "minute",
            Unit::Hours => "hour",
            Unit::Days => "day",
            Unit::Weeks => "week",
            Unit::Months => "month",
            Unit::Years => "year",
        }
    }

    /// Nanoseconds per unit, for units of invariant length. Days count as a
    /// flat 24 hours here; years, months, and weeks have no fixed length and
    /// return `None`.
    pub(crate) fn length_ns(self) -> Option<i128> {
        match self {
            Unit::Nanoseconds => Some(1),
            Unit::Microseconds => Some(1_000),
            Unit::Milliseconds => Some(1_000_000),
            Unit::Seconds => Some(1_000_000_000),
            Unit::Minutes => Some(60_000_000_000),
            Unit::Hours => Some(3_600_000_000_000),
            Unit::Days => Some(86_400_000_000_000),
            Unit::Weeks | Unit::Months | Unit::Years => None,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.singular())
    }
}

// ── Magnitudes ──────────────────────────────────────────────────────────────

/// The structured duration value: ten optional signed magnitudes.
///
/// Serialization is sparse — absent fields are skipped, so `{"hours":1.0}`
/// round-trips to a record with only `hours` set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Magnitudes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub months: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weeks: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milliseconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub microseconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nanoseconds: Option<f64>,
}

impl Magnitudes {
    /// The magnitude for `unit`, with absent fields reading as zero.
    pub fn get(&self, unit: Unit) -> f64 {
        match unit {
            Unit::Years => self.years,
            Unit::Months => self.months,
            Unit::Weeks => self.weeks,
            Unit::Days => self.days,
            Unit::Hours => self.hours,
            Unit::Minutes => self.minutes,
            Unit::Seconds => self.seconds,
            Unit::Milliseconds => self.milliseconds,
            Unit::Microseconds => self.microseconds,
            Unit::Nanoseconds => self.nanoseconds,
        }
        .unwrap_or(0.0)
    }

    /// Set the magnitude for `unit`, marking the field present.
    pub fn set(&mut self, unit: Unit, value: f64) {
        *self.slot_mut(unit) = Some(value);
    }

    /// All ten fields paired with their units, most significant first.
    /// Absent fields are `None`, distinguishing "unset" from an explicit zero.
    pub fn fields(&self) -> [(Unit, Option<f64>); 10] {
        [
            (Unit::Years, self.years),
            (Unit::Months, self.months),
            (Unit::Weeks, self.weeks),
            (Unit::Days, self.days),
            (Unit::Hours, self.hours),
            (Unit::Minutes, self.minutes),
            (Unit::Seconds, self.seconds),
            (Unit::Milliseconds, self.milliseconds),
            (Unit::Microseconds, self.microseconds),
            (Unit::Nanoseconds, self.nanoseconds),
        ]
    }

    /// +1, -1, or 0 according to the first non-zero field (most significant
    /// first). A valid record has all non-zero fields on the same sign, so
    /// for valid records this is the sign of the whole duration.
    pub fn sign(&self) -> i32 {
        for unit in Unit::DESCENDING {
            let v = self.get(unit);
            if v > 0.0 {
                return 1;
            }
            if v < 0.0 {
                return -1;
            }
        }
        0
    }

    /// Whether every field is zero or absent.
    pub fn is_zero(&self) -> bool {
        Unit::DESCENDING.into_iter().all(|unit| self.get(unit) == 0.0)
    }

    /// The most significant unit with a non-zero magnitude, if any.
    pub fn largest_unit(&self) -> Option<Unit> {
        Unit::DESCENDING.into_iter().find(|&unit| self.get(unit) != 0.0)
    }

    /// A copy with every present field negated.
    pub fn negated(&self) -> Self {
        self.map(|v| -v)
    }

    /// A copy with every present field made non-negative.
    pub fn abs(&self) -> Self {
        self.map(f64::abs)
    }

    /// Check the record against the duration algebra's validity rule:
    /// every present field finite, all non-zero fields on one sign, whole
    /// numbers for years through seconds (only the sub-second fields may be
    /// fractional), and magnitudes within the representable range.
    ///
    /// # Errors
    ///
    /// Returns [`SpanError::InvalidMagnitude`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        let sign = self.sign();
        let mut time_ns = 0.0f64;

        for (unit, value) in self.fields() {
            let Some(v) = value else { continue };
            if !v.is_finite() {
                return Err(SpanError::InvalidMagnitude(format!(
                    "{unit} is not finite"
                )));
            }
            if (v > 0.0 && sign < 0) || (v < 0.0 && sign > 0) {
                return Err(SpanError::InvalidMagnitude(format!(
                    "sign of {unit} conflicts with the rest of the duration"
                )));
            }
            if unit >= Unit::Seconds && v.fract() != 0.0 {
                return Err(SpanError::InvalidMagnitude(format!(
                    "{unit} must be a whole number, got {v}"
                )));
            }
            match unit.length_ns() {
                Some(len) => time_ns += v * len as f64,
                None => {
                    if v.abs() >= MAX_CALENDAR_UNIT {
                        return Err(SpanError::InvalidMagnitude(format!(
                            "{unit} exceeds the calendar unit limit: {v}"
                        )));
                    }
                }
            }
        }

        if time_ns.abs() >= MAX_TIME_NS {
            return Err(SpanError::InvalidMagnitude(
                "total time exceeds the representable range".to_string(),
            ));
        }
        Ok(())
    }

    fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        let mut out = Self::default();
        for (unit, value) in self.fields() {
            if let Some(v) = value {
                out.set(unit, f(v));
            }
        }
        out
    }

    fn slot_mut(&mut self, unit: Unit) -> &mut Option<f64> {
        match unit {
            Unit::Years => &mut self.years,
            Unit::Months => &mut self.months,
            Unit::Weeks => &mut self.weeks,
            Unit::Days => &mut self.days,
            Unit::Hours => &mut self.hours,
            Unit::Minutes => &mut self.minutes,
            Unit::Seconds => &mut self.seconds,
            Unit::Milliseconds => &mut self.milliseconds,
            Unit::Microseconds => &mut self.microseconds,
            Unit::Nanoseconds => &mut self.nanoseconds,
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
