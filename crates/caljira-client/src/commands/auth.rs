//! Authentication commands.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::{ClientConfig, GoogleSettings};
use crate::error::{ClientError, ClientResult};

use caljira_providers::CalendarProvider;
use caljira_providers::google::{GoogleProvider, OAuthCredentials};

/// Runs the Google authorization flow.
///
/// Credentials come from CLI flags, a `--credentials-file`, or
/// `config.toml`. Credentials given on the command line are written to
/// `config_path` so later `sync` runs find them.
pub async fn google(
    client_id: Option<String>,
    client_secret: Option<String>,
    credentials_file: Option<PathBuf>,
    force: bool,
    config: &ClientConfig,
    config_path: &Path,
) -> ClientResult<()> {
    let (credentials, source) = resolve_google_credentials(
        client_id,
        client_secret,
        credentials_file,
        config.google.as_ref(),
    )?;
    credentials
        .validate()
        .map_err(|e| ClientError::Config(format!("invalid Google credentials: {}", e)))?;

    let settings = GoogleSettings {
        client_id: Some(credentials.client_id.clone()),
        client_secret: Some(credentials.client_secret.clone()),
        credentials_file: None,
        ..config.google.clone().unwrap_or_default()
    };
    let provider =
        GoogleProvider::new(settings.to_provider_config().map_err(ClientError::Config)?)?;

    if force {
        provider.logout().await?;
    } else if provider.is_authenticated() {
        save_credentials(config_path, &credentials, source)?;
        println!("Already authenticated with Google Calendar.");
        println!("Use --force to re-authenticate.");
        return Ok(());
    }

    println!("Starting Google Calendar authentication...");
    println!();
    println!("A browser window will open for you to authorize access.");
    println!("If the browser doesn't open, copy the URL printed below.");
    println!();

    provider.authenticate().await?;
    save_credentials(config_path, &credentials, source)?;

    info!("authenticated with {}", provider.name());
    println!();
    println!("Authentication successful!");
    println!(
        "Tokens saved to {}",
        provider.config().token_path.display()
    );

    Ok(())
}

/// Where the credentials were resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CredentialSource {
    /// `--client-id`/`--client-secret` or `--credentials-file`.
    Cli,
    /// Already in `config.toml`.
    Config,
}

/// Resolves Google credentials.
///
/// Priority, highest first:
/// 1. `--client-id` + `--client-secret`
/// 2. `--credentials-file`
/// 3. the `[google]` section of `config.toml`
fn resolve_google_credentials(
    cli_client_id: Option<String>,
    cli_client_secret: Option<String>,
    cli_credentials_file: Option<PathBuf>,
    config_google: Option<&GoogleSettings>,
) -> ClientResult<(OAuthCredentials, CredentialSource)> {
    match (cli_client_id, cli_client_secret) {
        (Some(id), Some(secret)) => {
            return Ok((OAuthCredentials::new(id, secret), CredentialSource::Cli));
        }
        (Some(_), None) | (None, Some(_)) => {
            return Err(ClientError::Config(
                "both --client-id and --client-secret are required when providing credentials directly"
                    .to_string(),
            ));
        }
        (None, None) => {}
    }

    if let Some(ref path) = cli_credentials_file {
        let credentials = OAuthCredentials::from_file(path).map_err(|e| {
            ClientError::Config(format!(
                "failed to load credentials from {}: {}",
                path.display(),
                e
            ))
        })?;
        return Ok((credentials, CredentialSource::Cli));
    }

    if let Some(google) = config_google
        && google.has_credentials()
    {
        let credentials = google.resolve_credentials().map_err(|e| {
            ClientError::Config(format!(
                "failed to resolve Google credentials from config: {}",
                e
            ))
        })?;
        return Ok((credentials, CredentialSource::Config));
    }

    Err(ClientError::Config(format!(
        "Google credentials are required. Provide via:\n  \
         - client_id + client_secret in {}\n  \
         - --client-id and --client-secret flags\n  \
         - --credentials-file flag (path to Google Cloud Console JSON)\n  \
         - GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET env vars",
        ClientConfig::default_path().display()
    )))
}

/// Writes credentials under `[google]`, keeping the rest of the file intact.
///
/// No-op when the credentials already came from the file.
fn save_credentials(
    config_path: &Path,
    credentials: &OAuthCredentials,
    source: CredentialSource,
) -> ClientResult<()> {
    if source == CredentialSource::Config {
        return Ok(());
    }

    let content = if config_path.exists() {
        std::fs::read_to_string(config_path)?
    } else {
        String::new()
    };

    let mut doc = content.parse::<toml_edit::DocumentMut>().map_err(|e| {
        ClientError::Config(format!(
            "could not parse {} for writing: {}",
            config_path.display(),
            e
        ))
    })?;

    if !doc.contains_key("google") {
        doc["google"] = toml_edit::Item::Table(toml_edit::Table::new());
    }

    if let Some(google) = doc["google"].as_table_mut() {
        google["client_id"] = toml_edit::value(credentials.client_id.as_str());
        google["client_secret"] = toml_edit::value(credentials.client_secret.as_str());
        google.remove("credentials_file");
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(config_path, doc.to_string())?;

    info!("credentials saved to {}", config_path.display());
    println!("Credentials saved to {}", config_path.display());
    Ok(())
}
