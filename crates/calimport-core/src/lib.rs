//! Core types: imported events and venues, iCalendar time literals, tracing

pub mod event;
pub mod time;
pub mod tracing;

pub use event::{DomainEvent, DomainVenue};
pub use time::{LiteralTime, TimeParseError, ZonedTime, localize, parse_duration, staleness_cutoff};
pub use tracing::{LogFormat, TracingConfig, TracingError, init_tracing};
