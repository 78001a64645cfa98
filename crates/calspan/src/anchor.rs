//! Anchor context: the reference instant + zone that resolves
//! calendar-variable units.
//!
//! Years and months have no fixed length; adding or balancing them needs a
//! concrete date to count from. An [`Anchor`] carries that reference instant
//! together with the IANA zone whose local calendar the arithmetic should
//! follow (default UTC). Anchors are supplied per call, never stored on a
//! span.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::error::{Result, SpanError};

/// Reference instant plus the zone used to interpret it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    instant: DateTime<Utc>,
    zone: Tz,
}

impl Anchor {
    /// Anchor at `instant`, interpreted in UTC.
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant,
            zone: Tz::UTC,
        }
    }

    /// Anchor at `instant`, interpreted in the named IANA zone.
    ///
    /// # Errors
    ///
    /// Returns [`SpanError::InvalidTimezone`] if `zone` is not a valid IANA
    /// timezone name.
    ///
    /// # Examples
    ///
    /// ```
    /// use calspan::Anchor;
    /// use chrono::{TimeZone, Utc};
    ///
    /// let instant = Utc.with_ymd_and_hms(2026, 3, 7, 17, 0, 0).unwrap();
    /// let anchor = Anchor::with_zone(instant, "America/New_York").unwrap();
    /// // 17:00 UTC is noon Eastern (EST, UTC-5)
    /// assert_eq!(anchor.zoned().time().to_string(), "12:00:00");
    /// ```
    pub fn with_zone(instant: DateTime<Utc>, zone: &str) -> Result<Self> {
        let zone = zone
            .parse::<Tz>()
            .map_err(|_| SpanError::InvalidTimezone(format!("'{}'", zone)))?;
        Ok(Self { instant, zone })
    }

    /// The reference instant in UTC.
    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    /// The zone whose calendar the arithmetic follows.
    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// The reference instant expressed in the anchor's zone.
    pub fn zoned(&self) -> DateTime<Tz> {
        self.instant.with_timezone(&self.zone)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_defaults_to_utc() {
        let t = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        let anchor = Anchor::new(t);
        assert_eq!(anchor.zone(), Tz::UTC);
        assert_eq!(anchor.zoned().time().to_string(), "12:00:00");
    }

    #[test]
    fn test_with_zone_converts_to_local() {
        let t = Utc.with_ymd_and_hms(2026, 1, 15, 17, 0, 0).unwrap();
        let anchor = Anchor::with_zone(t, "America/New_York").unwrap();
        // January is EST (UTC-5), so 17:00 UTC = 12:00 local
        assert_eq!(anchor.zoned().time().to_string(), "12:00:00");
        assert_eq!(anchor.instant(), t);
    }

    #[test]
    fn test_invalid_zone_returns_error() {
        let t = Utc.with_ymd_and_hms(2026, 1, 15, 17, 0, 0).unwrap();
        let result = Anchor::with_zone(t, "Invalid/Zone");
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Invalid timezone"), "got: {err}");
    }
}
