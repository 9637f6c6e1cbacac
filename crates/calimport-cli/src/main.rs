//! calimport CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use calimport_cli::cli::{Cli, Command, ConfigAction};
use calimport_cli::config::ClientConfig;
use calimport_cli::error::{ClientError, ClientResult};
use calimport_core::init_tracing;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration
    let config = match cli.config {
        Some(ref path) => ClientConfig::load_from(path).map_err(ClientError::Config),
        None => Ok(ClientConfig::load().unwrap_or_default()),
    };

    // Initialize tracing
    let debug = cli.debug || config.as_ref().is_ok_and(|c| c.debug);
    let log = config.as_ref().map(|c| c.log.clone()).unwrap_or_default();
    let tracing_config = log.to_tracing_config(debug, cli.log_format);
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    // Run the command
    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            if let Some(hint) = e.hint() {
                eprintln!("hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: ClientConfig) -> ClientResult<()> {
    match cli.command {
        Command::Import(args) => calimport_cli::commands::import::run(args, &config).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => calimport_cli::commands::config::dump(&config),
            ConfigAction::Validate => calimport_cli::commands::config::validate(&config),
            ConfigAction::Path => calimport_cli::commands::config::path(),
        },
    }
}
