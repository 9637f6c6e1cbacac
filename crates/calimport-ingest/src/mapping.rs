//! `VEVENT` to [`DomainEvent`] mapping.
//!
//! The central rule is the split between fixed and floating times. A
//! `DTSTART` with a `TZID` parameter is an absolute instant in that zone. A
//! `DTSTART` without one is wall-clock time and is read in the importer's
//! configured default zone, never in UTC and never in the host's zone.
//!
//! The end time is resolved in this order:
//!
//! 1. zoned start and a `DTEND`: the `DTEND` instant in its own (or the start's) zone
//! 2. a `DTEND` literal: read in the default zone
//! 3. a `DURATION`: start plus duration
//! 4. otherwise: the start time (zero-length event)

use calimport_core::{DomainEvent, LiteralTime, ZonedTime, parse_duration};
use chrono::Duration;
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::grammar::{ComponentNode, PropertyNode};

/// Timing fields of one `VEVENT`, resolved but not yet defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTiming {
    /// Resolved `DTSTART`.
    pub start: ZonedTime,
    /// Resolved `DTEND`, if the component has a usable one.
    pub end: Option<ZonedTime>,
    /// Parsed `DURATION`, if the component has a usable one.
    pub duration: Option<Duration>,
    /// The zone named by `DTSTART;TZID=...`, if any.
    pub start_zone: Option<Tz>,
}

impl EventTiming {
    /// The end time after applying the duration and zero-length fallbacks.
    pub fn resolved_end(&self) -> ZonedTime {
        match (self.end, self.duration) {
            (Some(end), _) => end,
            (None, Some(duration)) => {
                self.start.checked_add_signed(duration).unwrap_or_else(|| {
                    warn!(%duration, start = %self.start, "DURATION overflows, treating event as zero-length");
                    self.start
                })
            }
            (None, None) => self.start,
        }
    }

    /// The end time used for staleness checks: `DTEND` if present, else `DTSTART`.
    pub fn effective_end(&self) -> ZonedTime {
        self.end.unwrap_or(self.start)
    }

    /// Returns true if the start carried an explicit, known timezone.
    pub fn is_zoned(&self) -> bool {
        self.start_zone.is_some()
    }
}

/// Maps parsed `VEVENT` components to domain events.
#[derive(Debug, Clone, Copy)]
pub struct EventFieldMapper {
    default_timezone: Tz,
}

impl EventFieldMapper {
    /// Creates a mapper reading floating times in `default_timezone`.
    pub fn new(default_timezone: Tz) -> Self {
        Self { default_timezone }
    }

    /// The zone floating times are read in.
    pub fn default_timezone(&self) -> Tz {
        self.default_timezone
    }

    /// Resolves the timing fields of `component`.
    ///
    /// Returns `None` if the component has no usable `DTSTART`.
    pub fn timing(&self, component: &ComponentNode) -> Option<EventTiming> {
        let dtstart = component.property("DTSTART")?;
        let start_literal = match LiteralTime::parse(&dtstart.value) {
            Ok(literal) => literal,
            Err(e) => {
                warn!(uid = ?component.property_value("UID"), error = %e, "Skipping event with unreadable DTSTART");
                return None;
            }
        };

        let start_zone = tzid_zone(dtstart);
        let start = match start_zone {
            Some(zone) => start_literal.resolve(&zone),
            None => start_literal.resolve(&self.default_timezone),
        };

        let end = component
            .property("DTEND")
            .and_then(|dtend| self.resolve_end(dtend, start_zone));

        let duration = component.property("DURATION").and_then(|prop| {
            parse_duration(&prop.value)
                .inspect_err(|e| warn!(error = %e, "Ignoring unreadable DURATION"))
                .ok()
        });

        Some(EventTiming {
            start,
            end,
            duration,
            start_zone,
        })
    }

    /// Builds the domain event for `component` from already-resolved timing.
    pub fn build(&self, component: &ComponentNode, timing: &EventTiming) -> DomainEvent {
        let mut event = DomainEvent::new(timing.start, timing.resolved_end());

        if let Some(summary) = component.property_value("SUMMARY") {
            event = event.with_title(unescape_text(summary));
        }
        if let Some(description) = component.property_value("DESCRIPTION") {
            event = event.with_description(unescape_text(description));
        }
        if let Some(url) = component.property_value("URL") {
            event = event.with_url(url.trim());
        }

        debug!(
            uid = ?component.property_value("UID"),
            title = ?event.title,
            start = %event.start_time,
            end = %event.end_time,
            zoned = timing.is_zoned(),
            "Mapped event"
        );

        event
    }

    /// Maps `component` in one step. Returns `None` without a usable `DTSTART`.
    pub fn map_event(&self, component: &ComponentNode) -> Option<DomainEvent> {
        let timing = self.timing(component)?;
        Some(self.build(component, &timing))
    }

    fn resolve_end(&self, dtend: &PropertyNode, start_zone: Option<Tz>) -> Option<ZonedTime> {
        let literal = LiteralTime::parse(&dtend.value)
            .inspect_err(|e| warn!(error = %e, "Ignoring unreadable DTEND"))
            .ok()?;

        Some(match start_zone {
            Some(zone) => literal.resolve(&tzid_zone(dtend).unwrap_or(zone)),
            None => literal.resolve(&self.default_timezone),
        })
    }
}

/// Windows zone names emitted by Outlook and Exchange, with their IANA
/// equivalents.
const WINDOWS_ZONES: &[(&str, &str)] = &[
    ("Alaskan Standard Time", "America/Anchorage"),
    ("AUS Eastern Standard Time", "Australia/Sydney"),
    ("Central Europe Standard Time", "Europe/Budapest"),
    ("Central European Standard Time", "Europe/Warsaw"),
    ("Central Standard Time", "America/Chicago"),
    ("China Standard Time", "Asia/Shanghai"),
    ("E. Australia Standard Time", "Australia/Brisbane"),
    ("Eastern Standard Time", "America/New_York"),
    ("GMT Standard Time", "Europe/London"),
    ("Hawaiian Standard Time", "Pacific/Honolulu"),
    ("India Standard Time", "Asia/Kolkata"),
    ("Mountain Standard Time", "America/Denver"),
    ("New Zealand Standard Time", "Pacific/Auckland"),
    ("Pacific Standard Time", "America/Los_Angeles"),
    ("Romance Standard Time", "Europe/Paris"),
    ("Russian Standard Time", "Europe/Moscow"),
    ("Singapore Standard Time", "Asia/Singapore"),
    ("Tokyo Standard Time", "Asia/Tokyo"),
    ("US Mountain Standard Time", "America/Phoenix"),
    ("UTC", "UTC"),
    ("W. Europe Standard Time", "Europe/Berlin"),
];

/// Maps vendor-specific TZIDs onto IANA names.
///
/// Strips the `/mozilla.org/` and `/softwarestudio.org/` prefixes (and the
/// version segment that follows them) and translates Windows zone names.
pub fn normalize_tzid(tzid: &str) -> &str {
    let tzid = tzid.trim().trim_matches('"');
    let stripped = match tzid
        .strip_prefix("/mozilla.org/")
        .or_else(|| tzid.strip_prefix("/softwarestudio.org/"))
    {
        Some(rest) => match rest.split_once('/') {
            Some((version, zone)) if version.starts_with(|c: char| c.is_ascii_digit()) => zone,
            _ => rest,
        },
        None => tzid,
    };

    WINDOWS_ZONES
        .iter()
        .find(|(windows, _)| windows.eq_ignore_ascii_case(stripped))
        .map(|(_, iana)| *iana)
        .unwrap_or(stripped)
}

/// Returns the IANA zone named by a property's `TZID` parameter.
///
/// Names still unknown after [`normalize_tzid`] are logged and treated as
/// absent, which makes the value floating.
fn tzid_zone(property: &PropertyNode) -> Option<Tz> {
    let raw = property.param("TZID")?;
    let tzid = normalize_tzid(raw);
    match tzid.parse::<Tz>() {
        Ok(zone) => Some(zone),
        Err(_) => {
            warn!(%tzid, property = %property.name, "Unknown TZID, reading value as floating time");
            None
        }
    }
}

/// Reverses RFC 5545 TEXT escaping (`\n`, `\,`, `\;`, `\\`).
pub fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
