//! An in-memory [`EquivalenceLookup`].
//!
//! Holds the records an import should be reconciled against. Events are
//! equivalent when their titles match (ignoring case and surrounding
//! whitespace) and they start at the same instant. Venues are equivalent when
//! their titles and street addresses match the same way.

use calimport_core::{DomainEvent, DomainVenue};
use serde::{Deserialize, Serialize};

use crate::services::EquivalenceLookup;

/// Serialized form of a store, as read from a seed file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSeed {
    pub events: Vec<DomainEvent>,
    pub venues: Vec<DomainVenue>,
}

/// Existing events and venues, kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    events: Vec<DomainEvent>,
    venues: Vec<DomainVenue>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a seed.
    ///
    /// Venues attached to seeded events are registered as venues too.
    pub fn from_seed(seed: StoreSeed) -> Self {
        let mut store = Self::new();
        for venue in seed.venues {
            store.insert_venue(venue);
        }
        for event in seed.events {
            store.insert_event(event);
        }
        store
    }

    /// Parses a JSON seed (`{"events": [...], "venues": [...]}`).
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the seed is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<StoreSeed>(json).map(Self::from_seed)
    }

    /// Adds an event, and its venue if that venue is not known yet.
    pub fn insert_event(&mut self, event: DomainEvent) {
        if let Some(ref venue) = event.venue {
            self.insert_venue(venue.clone());
        }
        self.events.push(event);
    }

    /// Adds a venue unless an equivalent one is already stored.
    pub fn insert_venue(&mut self, venue: DomainVenue) {
        if self.find_equivalent_venue(&venue).is_none() {
            self.venues.push(venue);
        }
    }

    /// Number of stored events.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Number of stored venues.
    pub fn venue_count(&self) -> usize {
        self.venues.len()
    }
}

impl EquivalenceLookup for InMemoryStore {
    fn find_equivalent_event(&self, event: &DomainEvent) -> Option<DomainEvent> {
        self.events
            .iter()
            .find(|stored| {
                stored.start_time == event.start_time
                    && same_text(stored.title.as_deref(), event.title.as_deref())
            })
            .cloned()
    }

    fn find_equivalent_venue(&self, venue: &DomainVenue) -> Option<DomainVenue> {
        self.venues
            .iter()
            .find(|stored| {
                same_text(stored.title.as_deref(), venue.title.as_deref())
                    && same_text(
                        stored.street_address.as_deref(),
                        venue.street_address.as_deref(),
                    )
            })
            .cloned()
    }
}

/// Compares optional text ignoring case and surrounding whitespace.
fn same_text(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
        (None, None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calimport_core::ZonedTime;
    use chrono::DateTime;

    fn at(rfc3339: &str) -> ZonedTime {
        DateTime::parse_from_rfc3339(rfc3339).unwrap()
    }

    fn event(title: &str, start: &str) -> DomainEvent {
        DomainEvent::new(at(start), at(start)).with_title(title)
    }

    #[test]
    fn event_equivalence_on_title_and_start() {
        let mut store = InMemoryStore::new();
        let stored = event("Jazz Night", "2024-05-01T19:00:00-07:00")
            .with_url("http://example.org/jazz");
        store.insert_event(stored.clone());

        let incoming = event("  jazz night ", "2024-05-02T02:00:00Z");
        assert_eq!(store.find_equivalent_event(&incoming), Some(stored));

        let later = event("Jazz Night", "2024-05-01T20:00:00-07:00");
        assert_eq!(store.find_equivalent_event(&later), None);
    }

    #[test]
    fn venue_equivalence_on_title_and_address() {
        let mut store = InMemoryStore::new();
        let stored = DomainVenue::titled("Crystal Ballroom")
            .with_street_address("1332 W Burnside St")
            .with_coordinates(45.52, -122.68);
        store.insert_venue(stored.clone());

        let incoming =
            DomainVenue::titled("CRYSTAL BALLROOM").with_street_address("1332 w burnside st");
        assert_eq!(store.find_equivalent_venue(&incoming), Some(stored));
        assert_eq!(
            store.find_equivalent_venue(&DomainVenue::titled("Crystal Ballroom")),
            None
        );
    }

    #[test]
    fn inserting_event_registers_its_venue_once() {
        let mut store = InMemoryStore::new();
        let venue = DomainVenue::titled("Library");
        store.insert_event(event("A", "2024-05-01T10:00:00Z").with_venue(venue.clone()));
        store.insert_event(event("B", "2024-05-02T10:00:00Z").with_venue(venue));

        assert_eq!(store.event_count(), 2);
        assert_eq!(store.venue_count(), 1);
    }

    #[test]
    fn seed_from_json() {
        let json = r#"{
            "events": [{
                "title": "Jazz Night",
                "description": null,
                "url": null,
                "start_time": "2024-05-01T19:00:00-07:00",
                "end_time": "2024-05-01T21:00:00-07:00",
                "venue": null
            }],
            "venues": [{ "title": "Library" }]
        }"#;
        let store = InMemoryStore::from_json(json).unwrap();
        assert_eq!(store.event_count(), 1);
        assert_eq!(store.venue_count(), 1);
        assert!(
            store
                .find_equivalent_venue(&DomainVenue::titled("library"))
                .is_some()
        );
    }

    #[test]
    fn malformed_seed_is_an_error() {
        assert!(InMemoryStore::from_json("{\"events\": 3}").is_err());
    }
}
