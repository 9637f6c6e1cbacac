//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/calimport/config.toml` by default:
//!
//! ```toml
//! debug = false
//!
//! [import]
//! default_timezone = "America/Los_Angeles"
//! stale_after_hours = 24
//!
//! [http]
//! timeout = 30
//!
//! [log]
//! format = "json"
//! filter = "calimport_ingest=debug"
//! ```

use std::path::{Path, PathBuf};

use calimport_core::{LogFormat, TracingConfig};
use calimport_ingest::ImportConfig;
use chrono::Duration;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Configuration for the calimport client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug mode.
    pub debug: bool,

    /// Import settings.
    #[serde(default)]
    pub import: ImportSettings,

    /// HTTP fetch settings.
    #[serde(default)]
    pub http: HttpSettings,

    /// Log output settings.
    #[serde(default)]
    pub log: LogSettings,
}

/// Log output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Output format: text, compact or json.
    pub format: LogFormat,

    /// Filter directive, overrides `RUST_LOG`.
    pub filter: Option<String>,
}

impl LogSettings {
    /// Builds subscriber settings; a format given on the command line wins.
    pub fn to_tracing_config(&self, debug: bool, format: Option<LogFormat>) -> TracingConfig {
        let config = TracingConfig::for_cli(debug).with_format(format.unwrap_or(self.format));
        match self.filter {
            Some(ref filter) => config.with_filter(filter),
            None => config,
        }
    }
}

/// Settings passed to the importer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// IANA zone used for floating times.
    pub default_timezone: String,

    /// Events that ended more than this many hours ago are dropped.
    pub stale_after_hours: u32,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            default_timezone: "UTC".to_string(),
            stale_after_hours: ImportConfig::DEFAULT_STALE_AFTER_HOURS as u32,
        }
    }
}

impl ImportSettings {
    /// Resolves the configured default zone.
    pub fn timezone(&self) -> Result<Tz, String> {
        parse_timezone(&self.default_timezone)
    }

    /// Converts to importer configuration.
    pub fn to_import_config(&self) -> Result<ImportConfig, String> {
        Ok(ImportConfig::default()
            .with_default_timezone(self.timezone()?)
            .with_stale_after(Duration::hours(i64::from(self.stale_after_hours))))
    }
}

/// HTTP fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Request timeout in seconds.
    pub timeout: u64,

    /// User agent override.
    pub user_agent: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: None,
        }
    }
}

#[cfg(feature = "http")]
impl HttpSettings {
    /// Converts to fetcher configuration.
    pub fn to_http_config(&self) -> calimport_ingest::HttpConfig {
        let config = calimport_ingest::HttpConfig::default()
            .with_timeout(std::time::Duration::from_secs(self.timeout));
        match self.user_agent {
            Some(ref agent) => config.with_user_agent(agent),
            None => config,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read config: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("calimport")
    }
}

/// Parses an IANA timezone name.
pub fn parse_timezone(name: &str) -> Result<Tz, String> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| format!("unknown timezone {:?}", name))
}
