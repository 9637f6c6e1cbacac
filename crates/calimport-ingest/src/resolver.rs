//! Linking events to their venues.
//!
//! An event refers to a venue through `LOCATION;VVENUE=<uid>:<text>`. When a
//! `VVENUE` block with that UID exists, its vCard fields become a structured
//! [`DomainVenue`]. When it does not, the plain location text still yields a
//! title-only venue. Every venue produced goes through the geocoder.

use calimport_core::DomainVenue;
use tracing::debug;

use crate::grammar::{ComponentNode, GrammarError, GrammarParser};
use crate::mapping::unescape_text;
use crate::services::Geocoder;
use crate::vcard::VCardFieldMap;
use crate::venue::{VenueBlock, find_venue_block};

/// vCard keys read from a venue block.
const KEY_NAME: &str = "NAME";
const KEY_ADDRESS: &str = "ADDRESS";
const KEY_CITY: &str = "CITY";
const KEY_REGION: &str = "REGION";
const KEY_POSTAL_CODE: &str = "POSTALCODE";
const KEY_COUNTRY: &str = "COUNTRY";
const KEY_GEO: &str = "GEO";

/// Resolves the venue of each event against the document's venue blocks.
pub struct VenueResolver<'a> {
    parser: &'a dyn GrammarParser,
    geocoder: &'a dyn Geocoder,
}

impl<'a> VenueResolver<'a> {
    /// Creates a resolver using `parser` for vCard bodies and `geocoder` for
    /// coordinate enrichment.
    pub fn new(parser: &'a dyn GrammarParser, geocoder: &'a dyn Geocoder) -> Self {
        Self { parser, geocoder }
    }

    /// Builds the venue for `event`, if it names one.
    ///
    /// # Errors
    ///
    /// Only [`GrammarError::Internal`] from the vCard parser; missing blocks,
    /// UIDs and fields all degrade to partial or absent venues.
    pub fn resolve(
        &self,
        event: &ComponentNode,
        blocks: &[VenueBlock],
    ) -> Result<Option<DomainVenue>, GrammarError> {
        let location = event.property("LOCATION");

        let block = location
            .and_then(|prop| prop.param("VVENUE"))
            .and_then(|uid| {
                let found = find_venue_block(blocks, uid);
                if found.is_none() {
                    debug!(%uid, "Event references a venue block that does not exist");
                }
                found
            });

        let fields = match block {
            Some(block) => block.vcard_fields(self.parser)?,
            None => None,
        };

        let venue = match fields {
            Some(fields) => Some(venue_from_fields(&fields)),
            None => location
                .map(|prop| unescape_text(prop.value.trim()))
                .filter(|text| !text.is_empty())
                .map(DomainVenue::titled),
        };

        Ok(venue.map(|mut venue| {
            self.geocoder.geocode(&mut venue);
            venue
        }))
    }
}

/// Builds a venue from a block's vCard fields.
pub fn venue_from_fields(fields: &VCardFieldMap) -> DomainVenue {
    let text = |key: &str| fields.non_empty(key).map(unescape_text);
    let (latitude, longitude) = match fields.get(KEY_GEO).and_then(parse_geo) {
        Some((lat, lon)) => (Some(lat), Some(lon)),
        None => (None, None),
    };

    DomainVenue {
        title: text(KEY_NAME),
        street_address: text(KEY_ADDRESS),
        locality: text(KEY_CITY),
        region: text(KEY_REGION),
        postal_code: text(KEY_POSTAL_CODE),
        country: text(KEY_COUNTRY),
        latitude,
        longitude,
    }
}

/// Parses `lat;lon`. Values with more than two parts use the first and last.
pub fn parse_geo(value: &str) -> Option<(f64, f64)> {
    let parts: Vec<&str> = value.split(';').map(str::trim).collect();
    if parts.len() < 2 {
        return None;
    }

    let latitude = parts.first()?.parse::<f64>().ok()?;
    let longitude = parts.last()?.parse::<f64>().ok()?;
    Some((latitude, longitude))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{IcalendarGrammar, PropertyNode};
    use crate::services::NoopGeocoder;
    use crate::vcard::map_vcard_lines;
    use crate::venue::extract_venue_blocks;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const BLOCKS: &str = "BEGIN:VVENUE\n\
                          UID:abc\n\
                          NAME:Crystal Ballroom\n\
                          ADDRESS:1332 W Burnside St\n\
                          CITY:Portland\n\
                          REGION:OR\n\
                          POSTALCODE:97209\n\
                          COUNTRY:USA\n\
                          GEO:37.5;-122.3\n\
                          END:VVENUE\n\
                          BEGIN:VVENUE\n\
                          NAME:No identifier\n\
                          END:VVENUE\n";

    /// Counts calls and stamps coordinates on venues that lack them.
    #[derive(Default)]
    struct CountingGeocoder {
        calls: AtomicUsize,
    }

    impl Geocoder for CountingGeocoder {
        fn geocode(&self, venue: &mut DomainVenue) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !venue.has_coordinates() {
                venue.latitude = Some(1.0);
                venue.longitude = Some(2.0);
            }
        }
    }

    fn event_at(location: Option<PropertyNode>) -> ComponentNode {
        let event = ComponentNode::new("VEVENT")
            .with_property(PropertyNode::new("DTSTART", "20240101T120000"));
        match location {
            Some(prop) => event.with_property(prop),
            None => event,
        }
    }

    #[test]
    fn resolves_block_by_uid() {
        let blocks = extract_venue_blocks(BLOCKS);
        let resolver = VenueResolver::new(&IcalendarGrammar, &NoopGeocoder);
        let event = event_at(Some(
            PropertyNode::new("LOCATION", "Crystal Ballroom").with_param("VVENUE", "abc"),
        ));

        let venue = resolver.resolve(&event, &blocks).unwrap().unwrap();
        assert_eq!(venue.title.as_deref(), Some("Crystal Ballroom"));
        assert_eq!(venue.street_address.as_deref(), Some("1332 W Burnside St"));
        assert_eq!(venue.locality.as_deref(), Some("Portland"));
        assert_eq!(venue.region.as_deref(), Some("OR"));
        assert_eq!(venue.postal_code.as_deref(), Some("97209"));
        assert_eq!(venue.country.as_deref(), Some("USA"));
        assert_eq!(venue.latitude, Some(37.5));
        assert_eq!(venue.longitude, Some(-122.3));
    }

    #[test]
    fn unknown_uid_falls_back_to_location_text() {
        let blocks = extract_venue_blocks(BLOCKS);
        let resolver = VenueResolver::new(&IcalendarGrammar, &NoopGeocoder);
        let event = event_at(Some(
            PropertyNode::new("LOCATION", "Somewhere else").with_param("VVENUE", "zzz"),
        ));

        let venue = resolver.resolve(&event, &blocks).unwrap().unwrap();
        assert_eq!(venue, DomainVenue::titled("Somewhere else"));
    }

    #[test]
    fn unreadable_block_falls_back_to_location_text() {
        struct RejectingParser;

        impl GrammarParser for RejectingParser {
            fn parse_calendar(
                &self,
                _text: &str,
            ) -> Result<Vec<crate::grammar::CalendarTree>, GrammarError> {
                Ok(Vec::new())
            }

            fn parse_vcard(&self, _text: &str) -> Result<crate::grammar::VCardTree, GrammarError> {
                Err(GrammarError::Rejected("unexpected line".to_string()))
            }
        }

        let blocks = extract_venue_blocks(BLOCKS);
        let geocoder = CountingGeocoder::default();
        let resolver = VenueResolver::new(&RejectingParser, &geocoder);
        let event = event_at(Some(
            PropertyNode::new("LOCATION", "Crystal Ballroom").with_param("VVENUE", "abc"),
        ));

        let mut venue = resolver.resolve(&event, &blocks).unwrap().unwrap();
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
        venue.latitude = None;
        venue.longitude = None;
        assert_eq!(venue, DomainVenue::titled("Crystal Ballroom"));
    }

    #[test]
    fn internal_vcard_failure_propagates() {
        struct PanickingParser;

        impl GrammarParser for PanickingParser {
            fn parse_calendar(
                &self,
                _text: &str,
            ) -> Result<Vec<crate::grammar::CalendarTree>, GrammarError> {
                Ok(Vec::new())
            }

            fn parse_vcard(&self, _text: &str) -> Result<crate::grammar::VCardTree, GrammarError> {
                Err(GrammarError::Internal("parser crashed".to_string()))
            }
        }

        let blocks = extract_venue_blocks(BLOCKS);
        let resolver = VenueResolver::new(&PanickingParser, &NoopGeocoder);
        let event = event_at(Some(
            PropertyNode::new("LOCATION", "Crystal Ballroom").with_param("VVENUE", "abc"),
        ));

        assert!(matches!(
            resolver.resolve(&event, &blocks),
            Err(GrammarError::Internal(_))
        ));
    }

    #[test]
    fn plain_location_gives_title_only_venue() {
        let resolver = VenueResolver::new(&IcalendarGrammar, &NoopGeocoder);
        let event = event_at(Some(PropertyNode::new("LOCATION", "Room 101\\, 1st floor")));

        let venue = resolver.resolve(&event, &[]).unwrap().unwrap();
        assert_eq!(venue.title.as_deref(), Some("Room 101, 1st floor"));
        assert!(venue.street_address.is_none());
        assert!(!venue.has_coordinates());
    }

    #[test]
    fn no_location_no_venue() {
        let geocoder = CountingGeocoder::default();
        let resolver = VenueResolver::new(&IcalendarGrammar, &geocoder);

        assert_eq!(resolver.resolve(&event_at(None), &[]).unwrap(), None);
        let blank = event_at(Some(PropertyNode::new("LOCATION", "   ")));
        assert_eq!(resolver.resolve(&blank, &[]).unwrap(), None);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn every_built_venue_is_geocoded() {
        let blocks = extract_venue_blocks(BLOCKS);
        let geocoder = CountingGeocoder::default();
        let resolver = VenueResolver::new(&IcalendarGrammar, &geocoder);

        let structured = event_at(Some(
            PropertyNode::new("LOCATION", "Crystal Ballroom").with_param("VVENUE", "abc"),
        ));
        let plain = event_at(Some(PropertyNode::new("LOCATION", "Park")));

        let first = resolver.resolve(&structured, &blocks).unwrap().unwrap();
        let second = resolver.resolve(&plain, &blocks).unwrap().unwrap();

        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 2);
        assert_eq!(first.latitude, Some(37.5));
        assert_eq!(second.latitude, Some(1.0));
    }

    #[test]
    fn geo_parsing() {
        assert_eq!(parse_geo("37.5;-122.3"), Some((37.5, -122.3)));
        assert_eq!(parse_geo(" 37.5 ; -122.3 "), Some((37.5, -122.3)));
        assert_eq!(parse_geo("37.5;0;-122.3"), Some((37.5, -122.3)));
        assert_eq!(parse_geo("37.5"), None);
        assert_eq!(parse_geo("north;west"), None);
    }

    #[test]
    fn fields_without_geo_leave_coordinates_empty() {
        let venue = venue_from_fields(&map_vcard_lines(["NAME:Hall", "CITY:"]));
        assert_eq!(venue.title.as_deref(), Some("Hall"));
        assert!(venue.locality.is_none());
        assert!(venue.latitude.is_none());
        assert!(venue.longitude.is_none());
    }
}
