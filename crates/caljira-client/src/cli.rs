//! Command-line interface definition.

use std::path::PathBuf;

use caljira_core::LookbackDays;
use clap::{Parser, Subcommand};

use crate::commands::sync::SyncOptions;

/// caljira - log time from tagged calendar events to Jira
#[derive(Debug, Parser)]
#[command(name = "caljira")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "CALJIRA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log tagged calendar events as Jira worklogs (the default)
    Sync {
        /// Days to look back; asked interactively when omitted
        #[arg(long, short, value_parser = clap::value_parser!(u32).range(LookbackDays::MIN as i64..=LookbackDays::MAX as i64))]
        days: Option<u32>,

        /// Log every tagged entry without asking
        #[arg(long)]
        no_review: bool,

        /// Show what would be logged without submitting
        #[arg(long)]
        dry_run: bool,
    },

    /// Authentication commands
    Auth {
        #[command(subcommand)]
        provider: AuthProvider,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

impl Command {
    /// Sync with every answer left to the prompts.
    pub fn default_sync() -> Self {
        Self::Sync {
            days: None,
            no_review: false,
            dry_run: false,
        }
    }
}

/// Converts the sync flags into pipeline options.
pub fn sync_options(days: Option<u32>, no_review: bool, dry_run: bool) -> SyncOptions {
    SyncOptions {
        days: days.and_then(|d| LookbackDays::new(d).ok()),
        review: no_review.then_some(false),
        dry_run,
    }
}

/// Authentication providers.
#[derive(Debug, Subcommand)]
pub enum AuthProvider {
    /// Authenticate with Google Calendar
    #[cfg(feature = "google")]
    Google {
        /// OAuth client ID (from Google Cloud Console)
        #[arg(long, env = "GOOGLE_CLIENT_ID")]
        client_id: Option<String>,

        /// OAuth client secret (from Google Cloud Console)
        #[arg(long, env = "GOOGLE_CLIENT_SECRET")]
        client_secret: Option<String>,

        /// Path to Google Cloud Console credentials JSON file
        ///
        /// The file downloaded from the OAuth 2.0 credentials page, with an
        /// `installed` or `web` section.
        #[arg(long, env = "GOOGLE_CREDENTIALS_FILE")]
        credentials_file: Option<PathBuf>,

        /// Discard stored tokens and authorize again
        #[arg(long, short)]
        force: bool,
    },
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
