//! The `import` command.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use calimport_core::DomainEvent;
use calimport_ingest::{ImportReport, Importer, InMemoryStore};
use chrono::Utc;
use tracing::debug;

use crate::cli::{ImportArgs, OutputFormat};
use crate::config::{ClientConfig, parse_timezone};
use crate::error::{ClientError, ClientResult};

/// Where a calendar comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// An `http`, `https` or `webcal` URL.
    Url(String),
    /// A local file.
    File(PathBuf),
}

impl Source {
    /// Classifies a command-line source argument.
    pub fn parse(source: &str) -> Self {
        let lower = source.to_ascii_lowercase();
        if ["http://", "https://", "webcal://"]
            .iter()
            .any(|scheme| lower.starts_with(scheme))
        {
            Self::Url(source.to_string())
        } else {
            Self::File(PathBuf::from(source))
        }
    }
}

/// Runs one import and prints the result.
pub async fn run(args: ImportArgs, config: &ClientConfig) -> ClientResult<()> {
    let mut import_config = config
        .import
        .to_import_config()
        .map_err(ClientError::Config)?;
    if let Some(ref name) = args.timezone {
        import_config =
            import_config.with_default_timezone(parse_timezone(name).map_err(ClientError::Config)?);
    }
    if args.include_stale {
        import_config = import_config.without_staleness_filter();
    }

    let mut importer = Importer::new(import_config);
    if let Some(ref path) = args.existing {
        importer = importer.with_lookup(load_seed(path).await?);
    }

    let now = Utc::now();
    let report = match Source::parse(&args.source) {
        Source::Url(url) => {
            let importer = with_http_fetcher(importer, config)?;
            importer.import_url(&url, now).await?
        }
        Source::File(path) => {
            debug!(path = %path.display(), "Reading calendar file");
            let text = tokio::fs::read_to_string(&path).await?;
            importer
                .import_text(&text, now)
                .map_err(|e| e.with_source_name(path.display().to_string()))?
        }
    };

    print!("{}", render(&report, args.format)?);
    Ok(())
}

#[cfg(feature = "http")]
fn with_http_fetcher(importer: Importer, config: &ClientConfig) -> ClientResult<Importer> {
    let fetcher = calimport_ingest::HttpFetcher::new(config.http.to_http_config())?;
    Ok(importer.with_fetcher(fetcher))
}

#[cfg(not(feature = "http"))]
fn with_http_fetcher(_importer: Importer, _config: &ClientConfig) -> ClientResult<Importer> {
    Err(ClientError::UnsupportedSource(
        "this build has no HTTP support".to_string(),
    ))
}

/// Loads the existing-records seed file.
async fn load_seed(path: &Path) -> ClientResult<InMemoryStore> {
    let json = tokio::fs::read_to_string(path).await?;
    let store = InMemoryStore::from_json(&json)
        .map_err(|e| ClientError::Seed(format!("{}: {}", path.display(), e)))?;
    debug!(
        events = store.event_count(),
        venues = store.venue_count(),
        "Loaded existing records"
    );
    Ok(store)
}

/// Renders a report in the requested format.
pub fn render(report: &ImportReport, format: OutputFormat) -> ClientResult<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)
            .map(|mut json| {
                json.push('\n');
                json
            })
            .map_err(|e| ClientError::Output(e.to_string())),
        OutputFormat::Text => Ok(render_text(report)),
    }
}

fn render_text(report: &ImportReport) -> String {
    let mut out = String::new();
    for event in &report.events {
        let _ = writeln!(out, "{}", event_line(event));
    }
    let _ = writeln!(
        out,
        "{} event(s) imported from {} calendar(s): {} parsed, {} stale, {} without start, {} duplicate(s)",
        report.events.len(),
        report.calendars,
        report.parsed,
        report.stale,
        report.skipped,
        report.duplicates(),
    );
    out
}

fn event_line(event: &DomainEvent) -> String {
    let mut line = format!(
        "{}  {}",
        event.start_time.format("%Y-%m-%d %H:%M %:z"),
        event.display_title()
    );

    if let Some(ref venue) = event.venue {
        let place: Vec<&str> = [venue.title.as_deref(), venue.locality.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if !place.is_empty() {
            line.push_str(" @ ");
            line.push_str(&place.join(", "));
        }
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use calimport_core::DomainVenue;
    use calimport_ingest::ImportConfig;
    use chrono::DateTime;
    use std::io::Write;

    fn sample_report() -> ImportReport {
        let start = DateTime::parse_from_rfc3339("2024-01-15T10:00:00-05:00").unwrap();
        let event = DomainEvent::new(start, start)
            .with_title("Standup")
            .with_venue(DomainVenue::titled("Town Hall").with_locality("Springfield"));
        ImportReport {
            calendars: 1,
            parsed: 3,
            skipped: 0,
            stale: 1,
            events: vec![event, DomainEvent::new(start, start)],
        }
    }

    #[test]
    fn source_classification() {
        assert_eq!(
            Source::parse("webcal://example.org/a.ics"),
            Source::Url("webcal://example.org/a.ics".to_string())
        );
        assert_eq!(
            Source::parse("HTTPS://example.org/a.ics"),
            Source::Url("HTTPS://example.org/a.ics".to_string())
        );
        assert_eq!(
            Source::parse("./calendars/a.ics"),
            Source::File(PathBuf::from("./calendars/a.ics"))
        );
    }

    #[test]
    fn text_output() {
        let text = render(&sample_report(), OutputFormat::Text).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "2024-01-15 10:00 -05:00  Standup @ Town Hall, Springfield");
        assert_eq!(lines[1], "2024-01-15 10:00 -05:00  (untitled)");
        assert!(lines[2].starts_with("2 event(s) imported from 1 calendar(s)"));
    }

    #[test]
    fn json_output() {
        let json = render(&sample_report(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["parsed"], 3);
        assert_eq!(value["events"][0]["title"], "Standup");
        assert_eq!(value["events"][0]["venue"]["locality"], "Springfield");
    }

    #[tokio::test]
    async fn seed_file_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"venues": [{{"title": "Town Hall"}}]}}"#).unwrap();

        let store = load_seed(file.path()).await.unwrap();
        assert_eq!(store.venue_count(), 1);
    }

    #[tokio::test]
    async fn malformed_seed_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        assert!(matches!(
            load_seed(file.path()).await,
            Err(ClientError::Seed(_))
        ));
    }

    #[tokio::test]
    async fn file_import_end_to_end() {
        let mut file = tempfile::Builder::new().suffix(".ics").tempfile().unwrap();
        write!(
            file,
            "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nSUMMARY:Picnic\r\nDTSTART:20990601T120000Z\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n"
        )
        .unwrap();

        let args = ImportArgs {
            source: file.path().display().to_string(),
            timezone: Some("Europe/Paris".to_string()),
            existing: None,
            include_stale: false,
            format: OutputFormat::Json,
        };
        assert!(run(args, &ClientConfig::default()).await.is_ok());

        let text = std::fs::read_to_string(file.path()).unwrap();
        let report = Importer::new(ImportConfig::default())
            .import_text(&text, Utc::now())
            .unwrap();
        assert_eq!(report.events[0].display_title(), "Picnic");
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let args = ImportArgs {
            source: "/definitely/not/here.ics".to_string(),
            timezone: None,
            existing: None,
            include_stale: false,
            format: OutputFormat::Text,
        };
        assert!(matches!(
            run(args, &ClientConfig::default()).await,
            Err(ClientError::Io(_))
        ));
    }

    #[tokio::test]
    async fn bad_timezone_flag_is_a_config_error() {
        let args = ImportArgs {
            source: "cal.ics".to_string(),
            timezone: Some("Nope/Nope".to_string()),
            existing: None,
            include_stale: false,
            format: OutputFormat::Text,
        };
        assert!(matches!(
            run(args, &ClientConfig::default()).await,
            Err(ClientError::Config(_))
        ));
    }
}
