//! Raw calendar text clean-up ahead of parsing.
//!
//! Third-party feeds routinely mix line terminators and label UTC times with
//! a `TZID=GMT` parameter instead of a `Z` suffix. Both quirks are rewritten
//! here so that the grammar parser and the venue block scanner see the same,
//! predictable text:
//!
//! 1. `\r\n` and lone `\r` become `\n`
//! 2. `;TZID=GMT:<value>` becomes `:<value>Z`, turning what would otherwise
//!    be an unresolvable zone name into a plain UTC instant
//!
//! Nothing else is touched. In particular, folded lines stay folded; the
//! grammar parser unfolds them itself.

use std::sync::LazyLock;

use regex::Regex;

/// Matches a GMT-labelled property value up to the end of its line.
static GMT_TZID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r";TZID=GMT:(.+)").expect("Invalid GMT TZID regex"));

/// Rewrites raw calendar text for parser compatibility.
///
/// The input is never modified; a new string is returned.
pub fn normalize_content(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    GMT_TZID_REGEX
        .replace_all(&unified, ":${1}Z")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crlf_becomes_lf() {
        let raw = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nEND:VCALENDAR\r\n";
        let normalized = normalize_content(raw);
        assert!(!normalized.contains('\r'));
        assert_eq!(normalized, "BEGIN:VCALENDAR\nVERSION:2.0\nEND:VCALENDAR\n");
    }

    #[test]
    fn lone_cr_becomes_lf() {
        assert_eq!(normalize_content("A:1\rB:2\r"), "A:1\nB:2\n");
    }

    #[test]
    fn gmt_tzid_collapses_to_utc_suffix() {
        assert_eq!(
            normalize_content("DTSTART;TZID=GMT:2024-01-01T00:00:00"),
            "DTSTART:2024-01-01T00:00:00Z"
        );
    }

    #[test]
    fn gmt_rewrite_runs_after_line_ending_cleanup() {
        assert_eq!(
            normalize_content("DTSTART;TZID=GMT:20240101T100000\r\nDTEND;TZID=GMT:20240101T110000\r\n"),
            "DTSTART:20240101T100000Z\nDTEND:20240101T110000Z\n"
        );
    }

    #[test]
    fn other_zones_are_left_alone() {
        let raw = "DTSTART;TZID=America/New_York:20240101T100000";
        assert_eq!(normalize_content(raw), raw);

        let raw = "DTSTART;TZID=GMT+1:20240101T100000";
        assert_eq!(normalize_content(raw), raw);
    }

    #[test]
    fn input_is_not_mutated() {
        let raw = String::from("X:1\r\n");
        let _ = normalize_content(&raw);
        assert_eq!(raw, "X:1\r\n");
    }

    #[test]
    fn snapshot_of_feed_header() {
        let raw = "BEGIN:VCALENDAR\r\n\
                   X-WR-CALNAME:Community\r\n\
                   BEGIN:VEVENT\r\n\
                   DTSTART;TZID=GMT:20240301T180000\r\n\
                   DTEND;TZID=GMT:20240301T200000\r\n\
                   SUMMARY:Open house\r\n\
                   END:VEVENT\r\n\
                   END:VCALENDAR";
        insta::assert_snapshot!(normalize_content(raw), @r"
        BEGIN:VCALENDAR
        X-WR-CALNAME:Community
        BEGIN:VEVENT
        DTSTART:20240301T180000Z
        DTEND:20240301T200000Z
        SUMMARY:Open house
        END:VEVENT
        END:VCALENDAR
        ");
    }
}
