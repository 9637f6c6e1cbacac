//! Imported event and venue records.
//!
//! - [`DomainEvent`]: one calendar entry as the aggregation platform stores it
//! - [`DomainVenue`]: the place an event happens, with optional address and
//!   coordinates
//!
//! Both types use full-field equality. Two records are "the same" for
//! de-duplication purposes only when every field matches, including the
//! attached venue.

use serde::{Deserialize, Serialize};

use crate::time::ZonedTime;

/// A venue attached to an imported event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainVenue {
    /// Display name of the venue.
    pub title: Option<String>,
    /// Street address line.
    pub street_address: Option<String>,
    /// City or town.
    pub locality: Option<String>,
    /// State, province or region.
    pub region: Option<String>,
    /// Postal or ZIP code.
    pub postal_code: Option<String>,
    /// Country name or code, as supplied by the source.
    pub country: Option<String>,
    /// Latitude in decimal degrees.
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees.
    pub longitude: Option<f64>,
}

impl DomainVenue {
    /// Creates a venue with only a title, used when an event names a place
    /// but carries no structured venue data.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Builder method to set the street address.
    pub fn with_street_address(mut self, address: impl Into<String>) -> Self {
        self.street_address = Some(address.into());
        self
    }

    /// Builder method to set the locality.
    pub fn with_locality(mut self, locality: impl Into<String>) -> Self {
        self.locality = Some(locality.into());
        self
    }

    /// Builder method to set the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Builder method to set the postal code.
    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self
    }

    /// Builder method to set the country.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Builder method to set both coordinates.
    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Returns true if both latitude and longitude are known.
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// An event produced by one import run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Event title (SUMMARY).
    pub title: Option<String>,
    /// Free-form description (DESCRIPTION).
    pub description: Option<String>,
    /// Link to the event's page (URL).
    pub url: Option<String>,
    /// When the event starts.
    pub start_time: ZonedTime,
    /// When the event ends. Equal to `start_time` for zero-length events.
    pub end_time: ZonedTime,
    /// Where the event happens, if known.
    pub venue: Option<DomainVenue>,
}

impl DomainEvent {
    /// Creates a new event spanning `start_time..end_time`.
    pub fn new(start_time: ZonedTime, end_time: ZonedTime) -> Self {
        Self {
            title: None,
            description: None,
            url: None,
            start_time,
            end_time,
            venue: None,
        }
    }

    /// Builder method to set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to set the URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Builder method to attach a venue.
    pub fn with_venue(mut self, venue: DomainVenue) -> Self {
        self.venue = Some(venue);
        self
    }

    /// Returns the title, or a placeholder for untitled events.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("(untitled)")
    }

    /// Returns the event's length.
    pub fn duration(&self) -> chrono::Duration {
        self.end_time - self.start_time
    }
}
