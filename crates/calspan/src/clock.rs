//! Injectable "now" capability.
//!
//! Every span operation that defaults to the current instant reads it through
//! a [`Clock`] supplied at construction, never from the system directly. The
//! process clock enters only at the outermost boundary ([`SystemClock`], the
//! default for [`Span::new`](crate::Span::new)); tests freeze time with
//! [`FixedClock`].

use chrono::{DateTime, Utc};

/// Source of the current instant.
pub trait Clock {
    /// The current instant in UTC.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Reads the OS clock via [`Utc::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant. Makes span computations deterministic
/// in tests.
///
/// # Examples
///
/// ```
/// use calspan::{Clock, FixedClock};
/// use chrono::{TimeZone, Utc};
///
/// let t = Utc.with_ymd_and_hms(2026, 2, 18, 14, 30, 0).unwrap();
/// assert_eq!(FixedClock(t).now_utc(), t);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
