//! Configuration commands.

use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Prints the loaded configuration as TOML.
pub fn dump(config: &ClientConfig, config_path: &Path) -> ClientResult<()> {
    println!("# config.toml ({})", config_path.display());
    println!("{}", render(config)?);
    Ok(())
}

fn render(config: &ClientConfig) -> ClientResult<String> {
    toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))
}

/// Checks that every configured section can be turned into a working client.
///
/// Secret references are resolved, so a `pass::` entry that does not exist
/// fails here rather than halfway through a sync.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    let jira = config.jira().map_err(ClientError::Config)?;
    jira.to_tracker_config()
        .map_err(|e| ClientError::Config(format!("invalid [jira] section: {}", e)))?;
    jira.resolve_credentials().map_err(ClientError::Config)?;
    println!("Jira settings are valid.");

    #[cfg(feature = "google")]
    if let Some(ref google) = config.google {
        google
            .to_provider_config()
            .map_err(|e| ClientError::Config(format!("invalid [google] section: {}", e)))?;
        println!("Google credentials are valid.");
    }

    println!("Configuration is valid.");
    Ok(())
}

/// Prints the configuration file path.
pub fn path(config_path: &Path) -> ClientResult<()> {
    println!("config: {}", config_path.display());
    Ok(())
}
