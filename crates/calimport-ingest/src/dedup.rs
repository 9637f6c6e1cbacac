//! Reconciling imported events with each other and with stored records.
//!
//! Each event is first swapped for its stored equivalent, if the lookup has
//! one, and then its venue gets the same treatment. Exact duplicates are
//! then dropped, keeping the first occurrence, so the output order follows
//! the document order.

use calimport_core::DomainEvent;
use tracing::debug;

use crate::services::EquivalenceLookup;

/// Substitutes stored equivalents and removes exact duplicates.
pub fn deduplicate(events: Vec<DomainEvent>, lookup: &dyn EquivalenceLookup) -> Vec<DomainEvent> {
    let total = events.len();
    let mut unique: Vec<DomainEvent> = Vec::with_capacity(total);

    for event in events {
        let mut event = match lookup.find_equivalent_event(&event) {
            Some(existing) => {
                debug!(title = ?existing.title, "Using stored event");
                existing
            }
            None => event,
        };

        if let Some(existing) = event
            .venue
            .as_ref()
            .and_then(|venue| lookup.find_equivalent_venue(venue))
        {
            debug!(venue = ?existing.title, "Using stored venue");
            event.venue = Some(existing);
        }

        if !unique.contains(&event) {
            unique.push(event);
        }
    }

    debug!(total, unique = unique.len(), "De-duplicated events");
    unique
}
