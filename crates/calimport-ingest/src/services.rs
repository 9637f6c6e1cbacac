//! External collaborators of the import pipeline.
//!
//! The pipeline owns parsing and mapping. Everything else is behind a trait:
//!
//! - [`Fetcher`]: turns a URL into calendar text
//! - [`Geocoder`]: enriches a venue with coordinates
//! - [`EquivalenceLookup`]: finds already-stored events and venues
//!
//! Fetching is async because it is I/O bound; the lookup and geocoder
//! hooks are plain synchronous calls made from inside one import run.

use std::future::Future;
use std::pin::Pin;

use calimport_core::{DomainEvent, DomainVenue};

use crate::error::ImportResult;

/// A boxed future for async trait methods.
///
/// Boxed futures keep [`Fetcher`] object-safe so the importer can hold a
/// `Box<dyn Fetcher>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Retrieves raw calendar text.
///
/// Implementations see URLs after [`fetch_url`] has rewritten `webcal:` to
/// `http:`. Timeouts and retries are the implementation's business.
pub trait Fetcher: Send + Sync {
    /// Returns the name of this fetcher (e.g., "http").
    fn name(&self) -> &str;

    /// Fetches the document at `url`.
    ///
    /// # Errors
    ///
    /// Returns a transport-class [`crate::ImportError`] on network or HTTP failure.
    fn fetch(&self, url: &str) -> BoxFuture<'_, ImportResult<String>>;
}

/// Adds coordinates to venues.
///
/// Called once per venue the resolver builds. Implementations may leave the
/// venue untouched; failures are theirs to handle and log.
pub trait Geocoder: Send + Sync {
    /// Enriches `venue` in place.
    fn geocode(&self, venue: &mut DomainVenue);
}

/// Looks up records the platform already has.
///
/// The definition of "equivalent" belongs to the implementation.
pub trait EquivalenceLookup: Send + Sync {
    /// Returns the stored event equivalent to `event`, if any.
    fn find_equivalent_event(&self, event: &DomainEvent) -> Option<DomainEvent>;

    /// Returns the stored venue equivalent to `venue`, if any.
    fn find_equivalent_venue(&self, venue: &DomainVenue) -> Option<DomainVenue>;
}

/// A geocoder that leaves every venue as it is.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGeocoder;

impl Geocoder for NoopGeocoder {
    fn geocode(&self, _venue: &mut DomainVenue) {}
}

/// A lookup that never finds anything, for imports with no existing records.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyLookup;

impl EquivalenceLookup for EmptyLookup {
    fn find_equivalent_event(&self, _event: &DomainEvent) -> Option<DomainEvent> {
        None
    }

    fn find_equivalent_venue(&self, _venue: &DomainVenue) -> Option<DomainVenue> {
        None
    }
}

/// Rewrites a `webcal:` URL to `http:` ahead of fetching.
///
/// Any other URL is returned unchanged.
pub fn fetch_url(url: &str) -> String {
    match url.strip_prefix("webcal:") {
        Some(rest) => format!("http:{rest}"),
        None => url.to_string(),
    }
}
