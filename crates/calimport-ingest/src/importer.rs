//! The import pipeline.
//!
//! [`Importer`] runs one document through every stage:
//!
//! ```text
//! raw text ─► normalize_content ─► parse_document ─► calendars
//!                     │                                  │
//!                     └─► extract_venue_blocks           ▼ for each VEVENT
//!                                    │          timing ─► staleness ─► build
//!                                    └──────────────► VenueResolver ─┘
//!                                                           │
//!                                                           ▼
//!                                                      deduplicate
//! ```
//!
//! A malformed document yields an empty report. Events without a usable
//! `DTSTART` are skipped and counted. Only internal parser failures and
//! transport failures surface as errors.

use std::time::Instant;

use calimport_core::{DomainEvent, staleness_cutoff};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::dedup::deduplicate;
use crate::document::{grammar_failure, parse_document};
use crate::error::{ImportError, ImportResult};
use crate::grammar::{GrammarParser, IcalendarGrammar};
use crate::mapping::EventFieldMapper;
use crate::normalize::normalize_content;
use crate::resolver::VenueResolver;
use crate::services::{EmptyLookup, EquivalenceLookup, Fetcher, Geocoder, NoopGeocoder, fetch_url};
use crate::staleness::StalenessFilter;
use crate::venue::extract_venue_blocks;

/// Settings for one [`Importer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportConfig {
    /// Zone used to read floating times.
    pub default_timezone: Tz,

    /// Events that ended longer ago than this are dropped.
    /// `None` keeps everything.
    pub stale_after: Option<Duration>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            default_timezone: Tz::UTC,
            stale_after: Some(Duration::hours(Self::DEFAULT_STALE_AFTER_HOURS)),
        }
    }
}

impl ImportConfig {
    /// Default staleness window in hours.
    pub const DEFAULT_STALE_AFTER_HOURS: i64 = 24;

    /// Sets the zone used for floating times.
    pub fn with_default_timezone(mut self, zone: Tz) -> Self {
        self.default_timezone = zone;
        self
    }

    /// Sets the staleness window.
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = Some(stale_after);
        self
    }

    /// Keeps events no matter how old they are.
    pub fn without_staleness_filter(mut self) -> Self {
        self.stale_after = None;
        self
    }
}

/// Outcome of one import run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    /// Number of `VCALENDAR` blocks parsed.
    pub calendars: usize,
    /// Number of `VEVENT` components seen.
    pub parsed: usize,
    /// Events skipped for lack of a usable `DTSTART`.
    pub skipped: usize,
    /// Events dropped as stale.
    pub stale: usize,
    /// The imported events, in document order.
    pub events: Vec<DomainEvent>,
}

impl ImportReport {
    /// Events removed because they duplicated an earlier one.
    pub fn duplicates(&self) -> usize {
        (self.parsed - self.skipped - self.stale).saturating_sub(self.events.len())
    }
}

/// Imports iCalendar documents into domain events.
pub struct Importer {
    config: ImportConfig,
    parser: Box<dyn GrammarParser>,
    geocoder: Box<dyn Geocoder>,
    lookup: Box<dyn EquivalenceLookup>,
    fetcher: Option<Box<dyn Fetcher>>,
}

impl Importer {
    /// Creates an importer with the bundled grammar parser, no geocoding,
    /// no stored records and no fetcher.
    pub fn new(config: ImportConfig) -> Self {
        Self {
            config,
            parser: Box::new(IcalendarGrammar::new()),
            geocoder: Box::new(NoopGeocoder),
            lookup: Box::new(EmptyLookup),
            fetcher: None,
        }
    }

    /// Replaces the grammar parser.
    pub fn with_parser(mut self, parser: impl GrammarParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    /// Replaces the geocoder.
    pub fn with_geocoder(mut self, geocoder: impl Geocoder + 'static) -> Self {
        self.geocoder = Box::new(geocoder);
        self
    }

    /// Replaces the equivalence lookup.
    pub fn with_lookup(mut self, lookup: impl EquivalenceLookup + 'static) -> Self {
        self.lookup = Box::new(lookup);
        self
    }

    /// Sets the fetcher used by [`Importer::import_url`].
    pub fn with_fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Some(Box::new(fetcher));
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Imports a document that is already in memory.
    ///
    /// `now` anchors the staleness cutoff.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseFailed`](crate::ImportErrorCode::ParseFailed) error
    /// when the grammar parser fails internally. Malformed input is not an
    /// error.
    pub fn import_text(&self, raw: &str, now: DateTime<Utc>) -> ImportResult<ImportReport> {
        let span = info_span!("import", tz = %self.config.default_timezone);
        let _enter = span.enter();
        let started = Instant::now();

        let text = normalize_content(raw);
        let calendars = parse_document(self.parser.as_ref(), &text)?;
        let blocks = extract_venue_blocks(&text);
        debug!(
            calendars = calendars.len(),
            venue_blocks = blocks.len(),
            "Parsed document"
        );

        let mapper = EventFieldMapper::new(self.config.default_timezone);
        let resolver = VenueResolver::new(self.parser.as_ref(), self.geocoder.as_ref());
        let filter = self
            .config
            .stale_after
            .map(|window| StalenessFilter::new(staleness_cutoff(now, window)));

        let mut report = ImportReport {
            calendars: calendars.len(),
            ..ImportReport::default()
        };
        let mut events = Vec::new();

        for component in calendars.iter().flat_map(|calendar| calendar.events()) {
            report.parsed += 1;

            let Some(timing) = mapper.timing(component) else {
                report.skipped += 1;
                continue;
            };

            if filter.is_some_and(|filter| filter.is_stale(&timing)) {
                debug!(uid = ?component.property_value("UID"), "Dropping stale event");
                report.stale += 1;
                continue;
            }

            let mut event = mapper.build(component, &timing);
            event.venue = resolver
                .resolve(component, &blocks)
                .map_err(grammar_failure)?;
            events.push(event);
        }

        report.events = deduplicate(events, self.lookup.as_ref());

        info!(
            calendars = report.calendars,
            parsed = report.parsed,
            skipped = report.skipped,
            stale = report.stale,
            imported = report.events.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Import finished"
        );

        Ok(report)
    }

    /// Fetches `url` and imports the result.
    ///
    /// `webcal:` URLs are fetched over `http:`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no fetcher is set, the fetcher's
    /// error on transport failure, or any [`Importer::import_text`] error.
    /// Errors carry the URL as their source name.
    pub async fn import_url(&self, url: &str, now: DateTime<Utc>) -> ImportResult<ImportReport> {
        let fetcher = self.fetcher.as_ref().ok_or_else(|| {
            ImportError::configuration("No fetcher configured for URL imports")
                .with_source_name(url)
        })?;

        let target = fetch_url(url);
        debug!(fetcher = fetcher.name(), url = %target, "Fetching calendar");
        let body = fetcher
            .fetch(&target)
            .await
            .map_err(|e| e.with_source_name(url))?;

        self.import_text(&body, now)
            .map_err(|e| e.with_source_name(url))
    }
}
