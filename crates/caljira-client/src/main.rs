//! caljira CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use caljira_client::cli::{Cli, Command, ConfigAction, sync_options};
use caljira_client::commands;
use caljira_client::config::ClientConfig;
use caljira_client::error::{ClientError, ClientResult};
use caljira_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path: PathBuf = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let config = if config_path.exists() {
        ClientConfig::load_from(&config_path).map_err(ClientError::Config)?
    } else if cli.config.is_some() {
        return Err(ClientError::Config(format!(
            "config file {} does not exist",
            config_path.display()
        )));
    } else {
        ClientConfig::default()
    };

    init_tracing(TracingConfig::for_cli(cli.debug || config.debug))?;

    match cli.command.unwrap_or_else(Command::default_sync) {
        Command::Sync {
            days,
            no_review,
            dry_run,
        } => {
            commands::sync::run(&config, sync_options(days, no_review, dry_run)).await?;
            Ok(())
        }
        Command::Auth { provider } => match provider {
            #[cfg(feature = "google")]
            caljira_client::cli::AuthProvider::Google {
                client_id,
                client_secret,
                credentials_file,
                force,
            } => {
                commands::auth::google(
                    client_id,
                    client_secret,
                    credentials_file,
                    force,
                    &config,
                    &config_path,
                )
                .await
            }
        },
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config_path),
        },
    }
}
