//! iCalendar ingestion for the calimport pipeline.
//!
//! This crate turns raw `.ics` documents, including the `VVENUE` extension
//! used by event listing sites, into [`DomainEvent`](calimport_core::DomainEvent)s:
//!
//! - [`normalize_content`] - Line ending and `TZID=GMT` cleanup
//! - [`parse_document`] - Grammar parsing with the recoverable/fatal split
//! - [`extract_venue_blocks`] - `VVENUE` block extraction
//! - [`EventFieldMapper`] - `VEVENT` to event mapping with fixed/floating times
//! - [`VenueResolver`] - Event to venue linking, with geocoding
//! - [`StalenessFilter`] and [`deduplicate`] - Post-processing
//! - [`Importer`] - The whole pipeline
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐
//! │  webcal / http  │    │   local file    │
//! └────────┬────────┘    └────────┬────────┘
//!          │ Fetcher              │
//!          └──────────┬───────────┘
//!                     │ raw text
//!                     ▼
//!              ┌─────────────┐
//!              │  Importer   │ ◄── Geocoder, EquivalenceLookup
//!              └──────┬──────┘
//!                     │
//!                     ▼ import_text()
//!              ┌──────────────────┐
//!              │  ImportReport    │
//!              └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use calimport_ingest::{ImportConfig, Importer};
//!
//! let importer = Importer::new(ImportConfig::default());
//! let report = importer.import_text(&ics, chrono::Utc::now())?;
//! for event in &report.events {
//!     println!("{} at {}", event.display_title(), event.start_time);
//! }
//! ```

pub mod dedup;
pub mod document;
pub mod error;
pub mod grammar;
#[cfg(feature = "http")]
pub mod http;
pub mod importer;
pub mod mapping;
pub mod normalize;
pub mod resolver;
pub mod services;
pub mod staleness;
pub mod store;
pub mod vcard;
pub mod venue;

// Re-export main types at crate root
pub use dedup::deduplicate;
pub use document::parse_document;
pub use error::{ImportError, ImportErrorCode, ImportResult};
pub use grammar::{
    CalendarTree, ComponentNode, GrammarError, GrammarParser, IcalendarGrammar, ParamNode,
    PropertyNode, VCardTree,
};
#[cfg(feature = "http")]
pub use http::{HttpConfig, HttpFetcher};
pub use importer::{ImportConfig, ImportReport, Importer};
pub use mapping::{EventFieldMapper, EventTiming, normalize_tzid, unescape_text};
pub use normalize::normalize_content;
pub use resolver::{VenueResolver, parse_geo, venue_from_fields};
pub use services::{
    BoxFuture, EmptyLookup, EquivalenceLookup, Fetcher, Geocoder, NoopGeocoder, fetch_url,
};
pub use staleness::StalenessFilter;
pub use store::{InMemoryStore, StoreSeed};
pub use vcard::{VCardFieldMap, map_vcard_lines};
pub use venue::{VenueBlock, extract_venue_blocks, find_venue_block};
