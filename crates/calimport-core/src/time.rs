//! Time handling for imported calendar data.
//!
//! iCalendar date-time literals come in two flavours that must never be
//! confused:
//!
//! - **Fixed**: the literal carries a `Z` suffix or a `TZID` parameter and
//!   names an absolute instant.
//! - **Floating**: the literal carries no zone at all and has to be read as
//!   wall-clock time in whatever zone the importer is configured with.
//!
//! This module provides [`LiteralTime`] for the zone-less parse step,
//! [`localize`] to pin a wall-clock time to a zone, [`parse_duration`] for
//! `DURATION` values and [`staleness_cutoff`] for the importer's "yesterday".

use chrono::{
    DateTime, Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc,
};
use thiserror::Error;

/// An instant together with the UTC offset it was resolved in.
pub type ZonedTime = DateTime<FixedOffset>;

/// Accepted DATE-TIME layouts, basic form first.
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y%m%dT%H%M%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y%m%dT%H%M",
    "%Y-%m-%dT%H:%M",
];

/// Accepted DATE layouts.
const DATE_FORMATS: &[&str] = &["%Y%m%d", "%Y-%m-%d"];

/// Errors raised while parsing iCalendar time literals.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeParseError {
    /// The value is not a DATE or DATE-TIME literal.
    #[error("invalid date-time literal: {0:?}")]
    InvalidDateTime(String),

    /// The value is not a DURATION literal.
    #[error("invalid duration literal: {0:?}")]
    InvalidDuration(String),
}

/// A DATE or DATE-TIME literal before any zone has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralTime {
    /// The literal ended in `Z`.
    Utc(NaiveDateTime),
    /// No zone designator. DATE values land here at midnight.
    Floating(NaiveDateTime),
}

impl LiteralTime {
    /// Parses a DATE-TIME (`20240101T120000`, `2024-01-01T12:00:00`, either
    /// optionally followed by `Z`) or a DATE (`20240101`) literal.
    pub fn parse(value: &str) -> Result<Self, TimeParseError> {
        let value = value.trim();
        let (body, is_utc) = match value.strip_suffix('Z') {
            Some(body) => (body, true),
            None => (value, false),
        };

        let naive = DATE_TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(body, fmt).ok())
            .or_else(|| {
                if is_utc {
                    return None;
                }
                DATE_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDate::parse_from_str(body, fmt).ok())
                    .map(|date| date.and_time(chrono::NaiveTime::MIN))
            })
            .ok_or_else(|| TimeParseError::InvalidDateTime(value.to_string()))?;

        Ok(if is_utc {
            Self::Utc(naive)
        } else {
            Self::Floating(naive)
        })
    }

    /// Returns the wall-clock reading of the literal.
    pub fn naive(&self) -> NaiveDateTime {
        match self {
            Self::Utc(naive) | Self::Floating(naive) => *naive,
        }
    }

    /// Returns `true` if the literal names an absolute instant on its own.
    pub fn is_utc(&self) -> bool {
        matches!(self, Self::Utc(_))
    }

    /// Resolves the literal, reading floating values as wall-clock time in `tz`.
    pub fn resolve<Tz: TimeZone>(&self, tz: &Tz) -> ZonedTime {
        match self {
            Self::Utc(naive) => Utc.from_utc_datetime(naive).fixed_offset(),
            Self::Floating(naive) => localize(*naive, tz),
        }
    }
}

/// Pins a wall-clock time to `tz`.
///
/// Ambiguous readings (DST fall-back) take the earlier instant. Readings that
/// do not exist (DST spring-forward gap) are read with the offset in force
/// before the gap, which moves them forward by the length of the gap.
pub fn localize<Tz: TimeZone>(naive: NaiveDateTime, tz: &Tz) -> ZonedTime {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.fixed_offset(),
        LocalResult::Ambiguous(earliest, _) => earliest.fixed_offset(),
        LocalResult::None => {
            let before_gap = tz
                .offset_from_local_datetime(&(naive - Duration::days(1)))
                .earliest()
                .map(|offset| offset.fix())
                .unwrap_or_else(|| Utc.fix());
            let utc = naive - Duration::seconds(i64::from(before_gap.local_minus_utc()));
            tz.from_utc_datetime(&utc).fixed_offset()
        }
    }
}

/// Parses an RFC 5545 DURATION value such as `PT1H`, `P1D`, `P2W` or `-PT15M`.
pub fn parse_duration(value: &str) -> Result<Duration, TimeParseError> {
    let value = value.trim();
    let (negative, body) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };

    let parsed = iso8601::duration(body)
        .map_err(|_| TimeParseError::InvalidDuration(value.to_string()))?;
    let std_duration: std::time::Duration = parsed.into();
    let duration = Duration::from_std(std_duration)
        .map_err(|_| TimeParseError::InvalidDuration(value.to_string()))?;

    Ok(if negative { -duration } else { duration })
}

/// Returns the instant before which an event counts as stale.
///
/// With the usual 24 hour window this is "yesterday" relative to `now`.
pub fn staleness_cutoff(now: DateTime<Utc>, stale_after: Duration) -> DateTime<Utc> {
    now - stale_after
}
