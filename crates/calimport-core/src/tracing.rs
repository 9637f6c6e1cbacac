//! Log output for import runs.
//!
//! The importer reports through `tracing`: one `info` summary per run,
//! `warn` for rejected documents, unknown TZIDs and unreadable venue blocks,
//! `debug` for every mapped event. This module installs the subscriber that
//! turns those into terminal text or JSON lines.
//!
//! Filter precedence is an explicit directive, then `RUST_LOG`, then
//! `calimport=<level>`.
//!
//! ```ignore
//! use calimport_core::tracing::{init_tracing, LogFormat, TracingConfig};
//!
//! init_tracing(TracingConfig::for_cli(false).with_format(LogFormat::Json))?;
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self as layer_fmt, format::FmtSpan},
    prelude::*,
};

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// Failed to set global subscriber
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    /// Failed to parse env filter directive
    #[error("failed to parse log filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),

    /// The log format name is not one of `text`, `compact` or `json`
    #[error("unknown log format {0:?} (expected text, compact or json)")]
    UnknownFormat(String),
}

/// How log lines are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human-oriented output
    Text,
    /// One line per record, for terminals
    #[default]
    Compact,
    /// JSON lines for log collectors; span close events carry run timings
    Json,
}

impl LogFormat {
    /// Returns the name used in configuration files and flags.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Compact => "compact",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = TracingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(TracingError::UnknownFormat(s.to_string())),
        }
    }
}

/// Subscriber settings for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Level for `calimport` targets when no directive or `RUST_LOG` applies
    pub level: Level,
    /// Output format
    pub format: LogFormat,
    /// Explicit filter directive, e.g. `calimport_ingest=trace`
    pub filter: Option<String>,
    /// Include file and line of each record
    pub include_location: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::for_cli(false)
    }
}

impl TracingConfig {
    /// Settings for the command-line tool.
    ///
    /// Quiet runs only show warnings; debug runs show per-event detail with
    /// source locations.
    #[must_use]
    pub fn for_cli(debug: bool) -> Self {
        Self {
            level: if debug { Level::DEBUG } else { Level::WARN },
            format: LogFormat::Compact,
            filter: None,
            include_location: debug,
        }
    }

    /// Set the output format
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set an explicit filter directive, overriding `RUST_LOG`
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// The directive used when neither a filter nor `RUST_LOG` is set.
    pub fn default_directive(&self) -> String {
        format!("calimport={}", self.level)
    }

    fn env_filter(&self) -> Result<EnvFilter, TracingError> {
        match self.filter {
            Some(ref filter) => Ok(EnvFilter::try_new(filter)?),
            None => Ok(EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.default_directive()))),
        }
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns an error if a subscriber is already installed or the filter
/// directive does not parse.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let env_filter = config.env_filter()?;
    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format {
        LogFormat::Text => {
            let layer = layer_fmt::layer()
                .pretty()
                .with_file(config.include_location)
                .with_line_number(config.include_location);
            tracing::subscriber::set_global_default(registry.with(layer))?;
        }
        LogFormat::Compact => {
            let layer = layer_fmt::layer()
                .compact()
                .without_time()
                .with_target(false)
                .with_file(config.include_location)
                .with_line_number(config.include_location);
            tracing::subscriber::set_global_default(registry.with(layer))?;
        }
        LogFormat::Json => {
            let layer = layer_fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_file(config.include_location)
                .with_line_number(config.include_location);
            tracing::subscriber::set_global_default(registry.with(layer))?;
        }
    }

    Ok(())
}
