//! Command-line interface definition.

use std::path::PathBuf;

use calimport_core::LogFormat;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// calimport - Import iCalendar feeds into events and venues
#[derive(Debug, Parser)]
#[command(name = "calimport")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "CALIMPORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Log format: text, compact or json (overrides the config file)
    #[arg(long, global = true, env = "CALIMPORT_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import one calendar and print its events
    Import(ImportArgs),

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments of `calimport import`.
#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Calendar URL (http, https, webcal) or path to a local .ics file
    pub source: String,

    /// IANA timezone used for floating times (overrides the config file)
    #[arg(long, env = "CALIMPORT_TIMEZONE")]
    pub timezone: Option<String>,

    /// JSON file of existing events and venues to reconcile against
    #[arg(long)]
    pub existing: Option<PathBuf>,

    /// Keep events that ended before the staleness cutoff
    #[arg(long)]
    pub include_stale: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// How imported events are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per event plus a summary
    #[default]
    Text,
    /// The full import report as JSON
    Json,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_with_flags() {
        let cli = Cli::try_parse_from([
            "calimport",
            "import",
            "webcal://example.org/feed.ics",
            "--timezone",
            "Europe/Paris",
            "--include-stale",
            "--format",
            "json",
        ])
        .unwrap();

        let Command::Import(args) = cli.command else {
            panic!("expected import command");
        };
        assert_eq!(args.source, "webcal://example.org/feed.ics");
        assert_eq!(args.timezone.as_deref(), Some("Europe/Paris"));
        assert!(args.include_stale);
        assert_eq!(args.format, OutputFormat::Json);
        assert!(args.existing.is_none());
    }

    #[test]
    fn import_defaults_to_text() {
        let cli = Cli::try_parse_from(["calimport", "import", "cal.ics"]).unwrap();
        let Command::Import(args) = cli.command else {
            panic!("expected import command");
        };
        assert_eq!(args.format, OutputFormat::Text);
        assert!(!args.include_stale);
    }

    #[test]
    fn import_requires_source() {
        assert!(Cli::try_parse_from(["calimport", "import"]).is_err());
    }

    #[test]
    fn config_subcommands() {
        let cli = Cli::try_parse_from(["calimport", "-v", "config", "path"]).unwrap();
        assert!(cli.debug);
        assert!(cli.log_format.is_none());
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigAction::Path
            }
        ));
    }

    #[test]
    fn log_format_flag() {
        let cli = Cli::try_parse_from(["calimport", "import", "cal.ics", "--log-format", "json"])
            .unwrap();
        assert_eq!(cli.log_format, Some(LogFormat::Json));

        assert!(
            Cli::try_parse_from(["calimport", "--log-format", "xml", "config", "path"]).is_err()
        );
    }
}
