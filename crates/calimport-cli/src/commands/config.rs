//! Configuration commands.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Dump the current configuration to stdout.
pub fn dump(config: &ClientConfig) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", ClientConfig::default_path().display());
    println!("{}", toml_str);

    Ok(())
}

/// Validate the configuration.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    let zone = config.import.timezone().map_err(ClientError::Config)?;
    if config.http.timeout == 0 {
        return Err(ClientError::Config(
            "http timeout must be greater than zero".to_string(),
        ));
    }

    println!("Floating times will be read in {}.", zone);
    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path() -> ClientResult<()> {
    let config_path = ClientConfig::default_path();
    println!("config: {}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn bad_timezone_fails_validation() {
        let mut config = ClientConfig::default();
        config.import.default_timezone = "Nowhere/Special".to_string();
        assert!(matches!(validate(&config), Err(ClientError::Config(_))));
    }

    #[test]
    fn zero_timeout_fails_validation() {
        let mut config = ClientConfig::default();
        config.http.timeout = 0;
        assert!(matches!(validate(&config), Err(ClientError::Config(_))));
    }

    #[test]
    fn dump_round_trips_through_toml() {
        let config = ClientConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: ClientConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.import.default_timezone, config.import.default_timezone);
        assert!(dump(&config).is_ok());
    }
}
