//! The duration engine.
//!
//! A [`Span`] owns one [`Magnitudes`] record and mutates it in place through
//! anchored, calendar-correct operations. Balancing always normalizes to
//! largest-unit-first with years on top, so thirteen months collapse to one
//! year one month and forty-five days to one month plus a remainder that
//! depends on the anchor's calendar.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

use crate::anchor::Anchor;
use crate::calendar;
use crate::clock::{Clock, SystemClock};
use crate::discord::{self, TimestampStyle};
use crate::error::{Result, SpanError};
use crate::magnitudes::{Magnitudes, Unit};
use crate::parse::parse;

// ── Input source ────────────────────────────────────────────────────────────

/// A span input: compact text to be parsed, or an already-built record.
///
/// Constructor, [`Span::add`], and [`Span::sub`] take `impl Into<SpanSource>`
/// so call sites pass `"1h30m"` or a [`Magnitudes`] directly; the variant is
/// resolved exactly once, at the call boundary.
#[derive(Debug, Clone)]
pub enum SpanSource<'a> {
    Text(&'a str),
    Magnitudes(Magnitudes),
}

impl<'a> From<&'a str> for SpanSource<'a> {
    fn from(text: &'a str) -> Self {
        SpanSource::Text(text)
    }
}

impl From<Magnitudes> for SpanSource<'_> {
    fn from(record: Magnitudes) -> Self {
        SpanSource::Magnitudes(record)
    }
}

impl SpanSource<'_> {
    /// Materialize the record and check it against the validity rule. The
    /// one place where text becomes magnitudes.
    fn resolve(self) -> Result<Magnitudes> {
        let record = match self {
            SpanSource::Text(text) => parse(text)?,
            SpanSource::Magnitudes(record) => record,
        };
        record.validate()?;
        Ok(record)
    }
}

// ── Span ────────────────────────────────────────────────────────────────────

/// A calendar-aware duration value.
///
/// The clock type parameter defaults to [`SystemClock`]; tests and other
/// deterministic callers inject a [`FixedClock`](crate::FixedClock) through
/// [`Span::with_clock`]. The clock is only read by operations that need a
/// current instant — construction and arithmetic with an explicit
/// [`Anchor`] never touch it.
#[derive(Debug, Clone)]
pub struct Span<C: Clock = SystemClock> {
    value: Magnitudes,
    clock: C,
}

impl Span {
    /// Build a span from text or a record, on the system clock.
    ///
    /// With an anchor the value is immediately rebalanced relative to it;
    /// without one the raw magnitudes are kept as written until an operation
    /// first balances them.
    ///
    /// # Errors
    ///
    /// Parse errors from text sources, [`SpanError::InvalidMagnitude`] for
    /// records violating the validity rule (mixed signs, non-finite values,
    /// fractions above the sub-second fields), and
    /// [`SpanError::OutOfRange`] if anchored balancing overflows.
    ///
    /// # Examples
    ///
    /// ```
    /// use calspan::Span;
    ///
    /// let span = Span::new("1h30m", None)?;
    /// assert_eq!(span.to_string(), "1 hour 30 minutes ");
    /// # Ok::<(), calspan::SpanError>(())
    /// ```
    pub fn new<'a>(source: impl Into<SpanSource<'a>>, anchor: Option<&Anchor>) -> Result<Self> {
        Self::with_clock(source, anchor, SystemClock)
    }
}

impl<C: Clock> Span<C> {
    /// [`Span::new`] with an injected clock.
    ///
    /// # Examples
    ///
    /// ```
    /// use calspan::{Anchor, FixedClock, Span};
    /// use chrono::{TimeZone, Utc};
    ///
    /// let instant = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    /// let anchor = Anchor::new(instant);
    /// let span = Span::with_clock("45d", Some(&anchor), FixedClock(instant))?;
    /// assert_eq!(span.magnitudes().months, Some(1.0));
    /// assert_eq!(span.magnitudes().days, Some(14.0));
    /// # Ok::<(), calspan::SpanError>(())
    /// ```
    pub fn with_clock<'a>(
        source: impl Into<SpanSource<'a>>,
        anchor: Option<&Anchor>,
        clock: C,
    ) -> Result<Self> {
        let mut value = source.into().resolve()?;
        if let Some(anchor) = anchor {
            let reference = anchor.zoned();
            let end = calendar::apply(reference, &value)?;
            value = calendar::span_between(reference, end, Unit::Years)?;
        }
        Ok(Self { value, clock })
    }

    /// Add a delta to this span, rebalancing against the reference.
    ///
    /// The reference instant is the anchor if given, otherwise the clock's
    /// current instant in UTC. The current value is applied to the
    /// reference, the delta to that intermediate, and the full
    /// reference-to-end span becomes the new value, so carries are
    /// calendar-true: forty-five days over February are fewer than over
    /// January, and thirteen months collapse into a year and a month.
    ///
    /// Mutation happens only after every fallible step has succeeded; a
    /// failed call leaves the span unchanged. Returns `&mut Self` for
    /// chaining.
    ///
    /// # Errors
    ///
    /// As for [`Span::new`], plus [`SpanError::OutOfRange`] when the
    /// intermediate or final instant leaves the calendar's range.
    ///
    /// # Examples
    ///
    /// ```
    /// use calspan::{Anchor, Span};
    /// use chrono::{TimeZone, Utc};
    ///
    /// let anchor = Anchor::new(Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap());
    /// let mut span = Span::new("11mo", Some(&anchor))?;
    /// span.add("2mo", Some(&anchor))?;
    /// assert_eq!(span.magnitudes().years, Some(1.0));
    /// assert_eq!(span.magnitudes().months, Some(1.0));
    /// # Ok::<(), calspan::SpanError>(())
    /// ```
    pub fn add<'a>(
        &mut self,
        delta: impl Into<SpanSource<'a>>,
        anchor: Option<&Anchor>,
    ) -> Result<&mut Self> {
        let delta = delta.into().resolve()?;
        self.apply_delta(&delta, anchor)
    }

    /// Subtract a delta from this span: [`Span::add`] with every field of
    /// the delta negated.
    ///
    /// # Errors
    ///
    /// As for [`Span::add`].
    pub fn sub<'a>(
        &mut self,
        delta: impl Into<SpanSource<'a>>,
        anchor: Option<&Anchor>,
    ) -> Result<&mut Self> {
        let delta = delta.into().resolve()?.negated();
        self.apply_delta(&delta, anchor)
    }

    fn apply_delta(&mut self, delta: &Magnitudes, anchor: Option<&Anchor>) -> Result<&mut Self> {
        let reference = match anchor {
            Some(anchor) => anchor.zoned(),
            None => self.clock.now_utc().with_timezone(&Tz::UTC),
        };
        let start = calendar::apply(reference, &self.value)?;
        let end = calendar::apply(start, delta)?;
        self.value = calendar::span_between(reference, end, Unit::Years)?;
        Ok(self)
    }

    /// The instant this span ends at: the clock's current instant plus the
    /// span's total milliseconds (truncated), totaled relative to the anchor
    /// or, absent one, relative to that same current instant.
    ///
    /// # Errors
    ///
    /// [`SpanError::OutOfRange`] if totaling or the final addition
    /// overflows.
    ///
    /// # Examples
    ///
    /// ```
    /// use calspan::{FixedClock, Span};
    /// use chrono::{Duration, TimeZone, Utc};
    ///
    /// let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    /// let span = Span::with_clock("90m", None, FixedClock(now))?;
    /// assert_eq!(span.end_date(None)?, now + Duration::minutes(90));
    /// # Ok::<(), calspan::SpanError>(())
    /// ```
    pub fn end_date(&self, anchor: Option<&Anchor>) -> Result<DateTime<Utc>> {
        let now = self.clock.now_utc();
        let reference = match anchor {
            Some(anchor) => anchor.zoned(),
            None => now.with_timezone(&Tz::UTC),
        };
        let total_ms = calendar::total_in(&self.value, Unit::Milliseconds, reference)?;
        now.checked_add_signed(Duration::milliseconds(total_ms.trunc() as i64))
            .ok_or_else(|| {
                SpanError::OutOfRange("end date exceeds the representable range".to_string())
            })
    }

    /// Render the span's end as a Discord `<t:{epoch}:f>` token (the
    /// default short date-time style).
    ///
    /// # Errors
    ///
    /// As for [`Span::end_date`].
    ///
    /// # Examples
    ///
    /// ```
    /// use calspan::{FixedClock, Span};
    /// use chrono::{TimeZone, Utc};
    ///
    /// let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    /// let span = Span::with_clock("2h", None, FixedClock(now))?;
    /// assert_eq!(span.to_discord_timestamp(None)?, "<t:1735696800:f>");
    /// # Ok::<(), calspan::SpanError>(())
    /// ```
    pub fn to_discord_timestamp(&self, anchor: Option<&Anchor>) -> Result<String> {
        self.to_discord_timestamp_with_style(TimestampStyle::default(), anchor)
    }

    /// [`Span::to_discord_timestamp`] with an explicit style.
    ///
    /// # Errors
    ///
    /// As for [`Span::end_date`].
    pub fn to_discord_timestamp_with_style(
        &self,
        style: TimestampStyle,
        anchor: Option<&Anchor>,
    ) -> Result<String> {
        let end = self.end_date(anchor)?;
        Ok(discord::render(end.timestamp(), style))
    }

    /// Read-only view of the current magnitude record.
    pub fn magnitudes(&self) -> &Magnitudes {
        &self.value
    }
}

/// Human rendering: non-zero fields most-significant-first over the fixed
/// list years, days, hours, minutes, seconds, each followed by one space
/// (the last included field too). Singular form at a magnitude of exactly
/// one; months, weeks, and sub-second fields are never rendered; an all-zero
/// span renders as the empty string.
impl<C: Clock> fmt::Display for Span<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for unit in [
            Unit::Years,
            Unit::Days,
            Unit::Hours,
            Unit::Minutes,
            Unit::Seconds,
        ] {
            let v = self.value.get(unit);
            if v == 0.0 {
                continue;
            }
            let plural = if v.abs() == 1.0 { "" } else { "s" };
            write!(f, "{} {}{} ", v, unit.singular(), plural)?;
        }
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;

    fn instant(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn anchor_at(y: i32, mo: u32, d: u32) -> Anchor {
        Anchor::new(instant(y, mo, d, 0, 0, 0))
    }

    /// For paths that must never consult the current time.
    #[derive(Debug, Clone, Copy)]
    struct PanickingClock;

    impl Clock for PanickingClock {
        fn now_utc(&self) -> DateTime<Utc> {
            panic!("clock must not be read")
        }
    }

    // ── Construction ────────────────────────────────────────────────────────

    #[test]
    fn test_new_without_anchor_keeps_raw_magnitudes() {
        let span = Span::new("90m", None).unwrap();
        assert_eq!(span.magnitudes().minutes, Some(90.0));
        assert_eq!(span.magnitudes().hours, None);
    }

    #[test]
    fn test_new_with_anchor_balances_immediately() {
        let anchor = anchor_at(2025, 1, 1);
        let span = Span::new("45d", Some(&anchor)).unwrap();
        assert_eq!(span.magnitudes().months, Some(1.0));
        assert_eq!(span.magnitudes().days, Some(14.0));
    }

    #[test]
    fn test_new_from_record() {
        let record = Magnitudes {
            hours: Some(2.0),
            ..Default::default()
        };
        let span = Span::new(record, None).unwrap();
        assert_eq!(span.magnitudes().hours, Some(2.0));
    }

    #[test]
    fn test_new_rejects_mixed_signs() {
        let err = Span::new("-1h30m", None).unwrap_err();
        assert!(matches!(err, SpanError::InvalidMagnitude(_)), "got: {err}");
    }

    #[test]
    fn test_new_rejects_fractional_minutes() {
        let err = Span::new("1.5m", None).unwrap_err();
        assert!(matches!(err, SpanError::InvalidMagnitude(_)), "got: {err}");
    }

    #[test]
    fn test_new_accepts_fractional_milliseconds() {
        let span = Span::new("1.5ms", None).unwrap();
        assert_eq!(span.magnitudes().milliseconds, Some(1.5));
    }

    #[test]
    fn test_new_propagates_parse_errors() {
        let err = Span::new("soon", None).unwrap_err();
        assert!(matches!(err, SpanError::EmptyOrInvalid(_)), "got: {err}");
    }

    #[test]
    fn test_anchored_operations_never_read_the_clock() {
        let anchor = anchor_at(2025, 3, 1);
        let mut span = Span::with_clock("1h", Some(&anchor), PanickingClock).unwrap();
        span.add("30m", Some(&anchor)).unwrap();
        span.sub("15m", Some(&anchor)).unwrap();
        assert_eq!(span.to_string(), "1 hour 15 minutes ");
    }

    // ── Display ─────────────────────────────────────────────────────────────

    #[test]
    fn test_display_plural_and_trailing_space() {
        let span = Span::new("1h30m", None).unwrap();
        assert_eq!(span.to_string(), "1 hour 30 minutes ");
    }

    #[test]
    fn test_display_singular_at_negative_one() {
        let record = Magnitudes {
            hours: Some(-1.0),
            ..Default::default()
        };
        let span = Span::new(record, None).unwrap();
        assert_eq!(span.to_string(), "-1 hour ");
    }

    #[test]
    fn test_display_zero_span_is_empty() {
        let span = Span::new("0s", None).unwrap();
        assert_eq!(span.to_string(), "");
    }

    #[test]
    fn test_display_hides_months_weeks_and_subseconds() {
        let span = Span::new("3w500ms", None).unwrap();
        assert_eq!(span.to_string(), "");

        let span = Span::new("1mo", None).unwrap();
        assert_eq!(span.to_string(), "");
    }

    #[test]
    fn test_display_orders_most_significant_first() {
        let span = Span::new("30m2y", None).unwrap();
        assert_eq!(span.to_string(), "2 years 30 minutes ");
    }

    // ── add / sub ───────────────────────────────────────────────────────────

    #[test]
    fn test_add_zero_delta_keeps_total() {
        let now = instant(2025, 6, 1, 12, 0, 0);
        let anchor = anchor_at(2025, 6, 1);
        let mut span = Span::with_clock("1h", Some(&anchor), FixedClock(now)).unwrap();
        let before = span.end_date(Some(&anchor)).unwrap();
        span.add("0s", Some(&anchor)).unwrap();
        span.add(Magnitudes::default(), Some(&anchor)).unwrap();
        assert_eq!(span.end_date(Some(&anchor)).unwrap(), before);
    }

    #[test]
    fn test_add_carries_days_into_months() {
        let anchor = anchor_at(2025, 1, 1);
        let mut span = Span::new("20d", Some(&anchor)).unwrap();
        span.add("15d", Some(&anchor)).unwrap();
        assert_eq!(span.magnitudes().months, Some(1.0));
        assert_eq!(span.magnitudes().days, Some(4.0));
    }

    #[test]
    fn test_add_months_across_a_nonexistent_wall_time() {
        // 07:30 UTC is 02:30 in America/New_York, a wall time that does not
        // exist one month later (2026-03-08 is the spring-forward day). The
        // two-month add must still balance; only the landing date matters.
        let anchor = Anchor::with_zone(instant(2026, 2, 8, 7, 30, 0), "America/New_York").unwrap();
        let mut span = Span::new("0s", Some(&anchor)).unwrap();
        span.add("2mo", Some(&anchor)).unwrap();
        assert_eq!(span.magnitudes().months, Some(2.0));
        assert_eq!(span.magnitudes().days, None);
    }

    #[test]
    fn test_add_without_anchor_uses_injected_clock() {
        let clock = FixedClock(instant(2025, 1, 1, 0, 0, 0));
        let mut span = Span::with_clock("20d", None, clock).unwrap();
        span.add("15d", None).unwrap();
        assert_eq!(span.magnitudes().months, Some(1.0));
        assert_eq!(span.magnitudes().days, Some(4.0));
    }

    #[test]
    fn test_sub_below_zero_goes_negative() {
        let anchor = anchor_at(2025, 3, 1);
        let mut span = Span::new("1h", Some(&anchor)).unwrap();
        span.sub("2h", Some(&anchor)).unwrap();
        assert_eq!(span.magnitudes().hours, Some(-1.0));
        assert_eq!(span.to_string(), "-1 hour ");
    }

    #[test]
    fn test_add_and_sub_chain() {
        let anchor = anchor_at(2025, 3, 1);
        let mut span = Span::new("1h", Some(&anchor)).unwrap();
        span.add("1h", Some(&anchor))
            .unwrap()
            .sub("30m", Some(&anchor))
            .unwrap();
        assert_eq!(span.magnitudes().hours, Some(1.0));
        assert_eq!(span.magnitudes().minutes, Some(30.0));
    }

    #[test]
    fn test_failed_add_leaves_span_unchanged() {
        let anchor = anchor_at(2025, 1, 1);
        let mut span = Span::new("1h", Some(&anchor)).unwrap();

        let err = span.add("gibberish", Some(&anchor)).unwrap_err();
        assert!(matches!(err, SpanError::EmptyOrInvalid(_)), "got: {err}");
        assert_eq!(span.magnitudes().hours, Some(1.0));

        // Valid record, but applying it overflows the month shifter.
        let err = span.add("4000000000y", Some(&anchor)).unwrap_err();
        assert!(matches!(err, SpanError::OutOfRange(_)), "got: {err}");
        assert_eq!(span.magnitudes().hours, Some(1.0));
    }

    // ── end_date / Discord ──────────────────────────────────────────────────

    #[test]
    fn test_end_date_with_anchor_totals_against_its_calendar() {
        let now = instant(2025, 6, 1, 12, 0, 0);
        let anchor = anchor_at(2025, 1, 15);
        let span = Span::with_clock("1mo", Some(&anchor), FixedClock(now)).unwrap();
        let end = span.end_date(Some(&anchor)).unwrap();
        assert_eq!(end, now + Duration::days(31));
    }

    #[test]
    fn test_end_date_truncates_fractional_milliseconds() {
        let now = instant(2025, 6, 1, 12, 0, 0);
        let record = Magnitudes {
            microseconds: Some(1500.0),
            ..Default::default()
        };
        let span = Span::with_clock(record, None, FixedClock(now)).unwrap();
        let end = span.end_date(None).unwrap();
        assert_eq!(end, now + Duration::milliseconds(1));
    }

    #[test]
    fn test_discord_token_for_zero_span_is_frozen_now() {
        let now = instant(2025, 1, 1, 0, 0, 0);
        let span = Span::with_clock("0s", None, FixedClock(now)).unwrap();
        let token = span.to_discord_timestamp(None).unwrap();
        assert_eq!(token, "<t:1735689600:f>");
    }

    #[test]
    fn test_discord_token_with_explicit_style() {
        let now = instant(2025, 1, 1, 0, 0, 0);
        let span = Span::with_clock("2h", None, FixedClock(now)).unwrap();
        let token = span
            .to_discord_timestamp_with_style(TimestampStyle::Relative, None)
            .unwrap();
        assert_eq!(token, "<t:1735696800:R>");
    }
}
