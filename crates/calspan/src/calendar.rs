//! Calendar arithmetic over `chrono`/`chrono-tz`.
//!
//! Everything here is zone-aware: year/month/week/day fields move the *local*
//! date (wall-clock time preserved, months clamped to month end), while hour
//! and smaller fields move the instant exactly. Ambiguous local results (DST
//! fall-back) resolve to the earlier instant; nonexistent local times (the
//! spring-forward gap) are an error.

use chrono::{DateTime, Datelike, Duration, LocalResult, Months, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

use crate::error::{Result, SpanError};
use crate::magnitudes::{Magnitudes, Unit};

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// Invariant-length units, largest first, for flat decomposition.
const TIME_UNITS: [Unit; 6] = [
    Unit::Hours,
    Unit::Minutes,
    Unit::Seconds,
    Unit::Milliseconds,
    Unit::Microseconds,
    Unit::Nanoseconds,
];

// ── Applying a record to an instant ─────────────────────────────────────────

/// Add a magnitude record to a reference instant, calendar-correctly.
///
/// Years and months shift the local date with chrono's clamping (Jan 31 plus
/// one month is Feb 28, or Feb 29 in a leap year); weeks and days shift the
/// local date directly. Both preserve the wall-clock time, so adding one day
/// across a DST transition changes the elapsed time by the transition's
/// offset. Hours and below are added as an exact instant delta afterwards.
///
/// # Errors
///
/// [`SpanError::OutOfRange`] if the result leaves chrono's representable
/// range or lands on a nonexistent local time.
pub(crate) fn apply(reference: DateTime<Tz>, m: &Magnitudes) -> Result<DateTime<Tz>> {
    let months = m.get(Unit::Years) as i64 * 12 + m.get(Unit::Months) as i64;
    let days = m.get(Unit::Weeks) as i64 * 7 + m.get(Unit::Days) as i64;
    let dated = shift(reference, months, days)?;

    let ns = time_ns(m);
    if ns == 0 {
        return Ok(dated);
    }
    let delta = delta_from_ns(ns)?;
    dated.checked_add_signed(delta).ok_or_else(|| {
        SpanError::OutOfRange("time fields move the instant beyond the calendar".to_string())
    })
}

/// Move `reference` by whole months and days on the local calendar, keeping
/// the wall-clock time. A zero shift returns the reference untouched (no
/// local-time re-resolution).
fn shift(reference: DateTime<Tz>, months: i64, days: i64) -> Result<DateTime<Tz>> {
    if months == 0 && days == 0 {
        return Ok(reference);
    }
    let date = shift_date(reference.date_naive(), months, days)?;
    resolve_local(&reference.timezone(), date.and_time(reference.time()))
}

/// [`shift`] on a plain date, with no zone involved.
fn shift_date(date: NaiveDate, months: i64, days: i64) -> Result<NaiveDate> {
    let mut date = date;
    if months != 0 {
        let magnitude = u32::try_from(months.unsigned_abs()).map_err(|_| {
            SpanError::OutOfRange(format!("month offset {months} overflows the calendar"))
        })?;
        date = if months > 0 {
            date.checked_add_months(Months::new(magnitude))
        } else {
            date.checked_sub_months(Months::new(magnitude))
        }
        .ok_or_else(|| {
            SpanError::OutOfRange(format!("no representable date {months} months away"))
        })?;
    }
    if days != 0 {
        date = Duration::try_days(days)
            .and_then(|delta| date.checked_add_signed(delta))
            .ok_or_else(|| {
                SpanError::OutOfRange(format!("no representable date {days} days away"))
            })?;
    }
    Ok(date)
}

/// Resolve a shifted local datetime back to an instant in `zone`.
fn resolve_local(zone: &Tz, local: NaiveDateTime) -> Result<DateTime<Tz>> {
    match zone.from_local_datetime(&local) {
        LocalResult::Single(resolved) => Ok(resolved),
        LocalResult::Ambiguous(earlier, _) => Ok(earlier),
        LocalResult::None => Err(SpanError::OutOfRange(format!(
            "local time {local} does not exist in {zone}"
        ))),
    }
}

// ── Balanced differences ────────────────────────────────────────────────────

/// The balanced, largest-unit-first span from `reference` to `target`.
///
/// The year/month/day walk runs on the naive local calendar: whole years and
/// months are counted by stepping clamped candidate dates until one passes
/// the target's local date (so the count is exactly what [`apply`] would
/// reproduce), and only the finally chosen day nucleus is resolved back to
/// an instant. Near a transition that nucleus can land on the wrong side of
/// the target, or on a wall time that does not exist at all, so the end date
/// backs off by single days until the sub-day remainder agrees with the
/// overall direction; the remainder is then decomposed into hours and below.
/// Weeks or days as `largest` skip the month stepping; hours and below
/// decompose the exact delta flat.
pub(crate) fn span_between(
    reference: DateTime<Tz>,
    target: DateTime<Tz>,
    largest: Unit,
) -> Result<Magnitudes> {
    let mut out = Magnitudes::default();
    if target == reference {
        return Ok(out);
    }
    if largest < Unit::Days {
        decompose_time(&mut out, delta_ns(target - reference), largest);
        return Ok(out);
    }

    let sign: i64 = if target > reference { 1 } else { -1 };
    let start = reference.naive_local();
    let end = target.naive_local();

    // A fall-back window straddling midnight can put the target's local date
    // behind the reference's even though the instant is ahead; the whole
    // difference is sub-day then.
    let base = if date_surpasses(-sign, end.date(), start.date()) {
        start.date()
    } else {
        end.date()
    };
    let max_correction: i64 = if sign > 0 { 2 } else { 1 };
    let mut correction: i64 = 0;
    let mut last_err = None;

    while correction <= max_correction {
        let end_date = shift_date(base, 0, -correction * sign)?;
        let landed = if end_date == start.date() {
            // The nucleus is the reference's own wall datetime; keep its
            // instant rather than re-resolving what may be a repeated time.
            reference
        } else {
            match resolve_local(&reference.timezone(), end_date.and_time(start.time())) {
                Ok(landed) => landed,
                Err(err) => {
                    // A nucleus on a nonexistent wall time splits off no
                    // whole day; the next correction may still find one.
                    last_err = Some(err);
                    correction += 1;
                    continue;
                }
            }
        };
        let remainder = delta_ns(target - landed);
        if remainder == 0 || remainder.signum() as i64 == sign {
            let (years, months, mut days) = date_until(start.date(), end_date, largest)?;
            if largest == Unit::Weeks {
                let weeks = days / 7;
                days -= weeks * 7;
                if weeks != 0 {
                    out.set(Unit::Weeks, weeks as f64);
                }
            }
            if years != 0 {
                out.set(Unit::Years, years as f64);
            }
            if months != 0 {
                out.set(Unit::Months, months as f64);
            }
            if days != 0 {
                out.set(Unit::Days, days as f64);
            }
            decompose_time(&mut out, remainder, Unit::Hours);
            return Ok(out);
        }
        correction += 1;
    }

    Err(last_err.unwrap_or_else(|| {
        SpanError::OutOfRange(format!(
            "no day boundary aligns between {start} and {end} in {}",
            reference.timezone()
        ))
    }))
}

/// Pure calendar-date difference, largest-unit-first: greedy whole years,
/// then months, by stepping clamped candidate dates until one passes `to`,
/// then the exact day count from the last nucleus. A `largest` below months
/// yields days only.
fn date_until(from: NaiveDate, to: NaiveDate, largest: Unit) -> Result<(i64, i64, i64)> {
    if to == from {
        return Ok((0, 0, 0));
    }
    let sign: i64 = if to > from { 1 } else { -1 };
    let mut years: i64 = 0;
    let mut months: i64 = 0;

    if largest >= Unit::Months {
        // Years: start from the raw year difference, back off one step, then
        // advance while the candidate date does not pass the target.
        let mut candidate = i64::from(to.year()) - i64::from(from.year());
        if candidate != 0 {
            candidate -= sign;
        }
        loop {
            let landed = shift_date(from, candidate * 12, 0)?;
            if date_surpasses(sign, landed, to) {
                break;
            }
            years = candidate;
            candidate += sign;
        }

        // Months: step one at a time from the year mark (at most 12 steps).
        let mut candidate = sign;
        loop {
            let landed = shift_date(from, years * 12 + candidate, 0)?;
            if date_surpasses(sign, landed, to) {
                break;
            }
            months = candidate;
            candidate += sign;
        }

        if largest == Unit::Months {
            months += years * 12;
            years = 0;
        }
    }

    let nucleus = shift_date(from, years * 12 + months, 0)?;
    let days = to.signed_duration_since(nucleus).num_days();
    Ok((years, months, days))
}

/// Whether `candidate` has moved past `to` in the direction of `sign`.
/// Landing exactly on it does not count as surpassing.
fn date_surpasses(sign: i64, candidate: NaiveDate, to: NaiveDate) -> bool {
    if sign > 0 {
        candidate > to
    } else {
        candidate < to
    }
}

/// Split a nanosecond delta into whole counts of `largest` and every smaller
/// invariant-length unit, setting only the non-zero fields.
fn decompose_time(out: &mut Magnitudes, mut ns: i128, largest: Unit) {
    for unit in TIME_UNITS {
        if unit > largest {
            continue;
        }
        let Some(len) = unit.length_ns() else { continue };
        let count = ns / len;
        ns -= count * len;
        if count != 0 {
            out.set(unit, count as f64);
        }
    }
}

// ── Totals ──────────────────────────────────────────────────────────────────

/// Express a record as a single float total of `unit`, relative to
/// `reference`: the exact elapsed time of `reference` to
/// `apply(reference, m)` divided by the unit's fixed length. Days count as a
/// flat 24 hours for the division.
///
/// # Errors
///
/// [`SpanError::InvalidMagnitude`] for variable-length units (weeks, months,
/// years); [`SpanError::OutOfRange`] if applying the record overflows.
pub(crate) fn total_in(m: &Magnitudes, unit: Unit, reference: DateTime<Tz>) -> Result<f64> {
    let len = unit.length_ns().ok_or_else(|| {
        SpanError::InvalidMagnitude(format!("cannot total in variable-length unit {unit}"))
    })?;
    let end = apply(reference, m)?;
    Ok(delta_ns(end - reference) as f64 / len as f64)
}

// ── Nanosecond plumbing ─────────────────────────────────────────────────────

/// Exact nanoseconds of a chrono delta. `Duration::num_nanoseconds` overflows
/// its `i64` near ±292 years; seconds plus the sub-second part never does.
fn delta_ns(delta: Duration) -> i128 {
    i128::from(delta.num_seconds()) * NANOS_PER_SECOND + i128::from(delta.subsec_nanos())
}

/// Sum of the hour-and-below fields in nanoseconds. Hours, minutes, and
/// seconds are integral by the validity rule; sub-second fields may carry a
/// fraction and are rounded at the very end.
fn time_ns(m: &Magnitudes) -> i128 {
    let whole = m.get(Unit::Hours) as i128 * 3_600_000_000_000
        + m.get(Unit::Minutes) as i128 * 60_000_000_000
        + m.get(Unit::Seconds) as i128 * 1_000_000_000;
    let frac = m.get(Unit::Milliseconds) * 1e6
        + m.get(Unit::Microseconds) * 1e3
        + m.get(Unit::Nanoseconds);
    whole + frac.round() as i128
}

fn delta_from_ns(ns: i128) -> Result<Duration> {
    let seconds = i64::try_from(ns.div_euclid(NANOS_PER_SECOND)).map_err(|_| {
        SpanError::OutOfRange("time delta exceeds the representable range".to_string())
    })?;
    let nanos = ns.rem_euclid(NANOS_PER_SECOND) as u32;
    Duration::new(seconds, nanos).ok_or_else(|| {
        SpanError::OutOfRange("time delta exceeds the representable range".to_string())
    })
}

// ── Tests ───────────────────────────────────────────────────────────────────
