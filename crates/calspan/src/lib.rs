//! # calspan
//!
//! Calendar-aware duration spans.
//!
//! calspan parses compact duration strings (`"1y2mo3d4h"`) into a ten-field
//! magnitude record and does calendar-correct arithmetic on it relative to an
//! anchor instant and time zone: months clamp at month end, day shifts keep
//! the wall clock across DST, and results rebalance largest-unit-first so
//! thirteen months become one year and one month. Spans render as human text
//! or as Discord `<t:{epoch}:{style}>` timestamp tokens.
//!
//! ## Modules
//!
//! - [`mod@parse`] — compact duration string → magnitude record
//! - [`magnitudes`] — the ten-field record and its unit taxonomy
//! - [`span`] — the owning duration value: add, sub, end date, rendering
//! - [`anchor`] — reference instant + IANA zone for calendar-relative math
//! - [`clock`] — injectable current-time capability
//! - [`discord`] — Discord timestamp styles and token formatting
//! - [`error`] — Error types

pub mod anchor;
pub mod clock;
pub mod discord;
pub mod error;
pub mod magnitudes;
pub mod parse;
pub mod span;

mod calendar;

pub use anchor::Anchor;
pub use clock::{Clock, FixedClock, SystemClock};
pub use discord::TimestampStyle;
pub use error::{Result, SpanError};
pub use magnitudes::{Magnitudes, Unit};
pub use parse::parse;
pub use span::{Span, SpanSource};
