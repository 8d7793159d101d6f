//! Tracing setup for caljira.
//!
//! The CLI logs through `tracing`; user-facing output (prompts, results)
//! goes to stdout separately, so the default level is quiet.
//!
//! ```ignore
//! use caljira_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::for_cli(debug))?;
//! ```

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

/// Crates whose events pass the default filter.
const CRATE_TARGETS: [&str; 3] = ["caljira_core", "caljira_providers", "caljira_client"];

/// Why logging could not be set up.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// How log lines are rendered on stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// One line per event.
    #[default]
    Compact,
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging setup for the `caljira` binary.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// The level applied to caljira crates when RUST_LOG is not set
    pub default_level: Level,
    pub output_format: TracingOutputFormat,
    /// Add `file:line` to each event.
    pub include_location: bool,
    /// Add the module path to each event.
    pub include_target: bool,
    pub include_timestamp: bool,
    /// Log span closes with their busy/idle times.
    pub include_span_events: bool,
    /// Full filter directive; wins over `RUST_LOG` and `default_level`.
    pub env_filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: Level::WARN,
            output_format: TracingOutputFormat::Compact,
            include_location: false,
            include_target: false,
            include_timestamp: false,
            include_span_events: false,
            env_filter: None,
        }
    }
}

impl TracingConfig {
    /// Config for the CLI; `debug` raises the level and adds locations.
    #[must_use]
    pub fn for_cli(debug: bool) -> Self {
        if debug {
            Self {
                default_level: Level::DEBUG,
                include_location: true,
                include_target: true,
                include_timestamp: true,
                include_span_events: true,
                ..Self::default()
            }
        } else {
            Self::default()
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: TracingOutputFormat) -> Self {
        self.output_format = format;
        self
    }

    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// The directive used when neither `env_filter` nor `RUST_LOG` is set.
    ///
    /// Third-party crates stay at `warn`.
    pub fn default_directive(&self) -> String {
        let level = self.default_level.to_string().to_lowercase();
        let mut parts = vec!["warn".to_string()];
        parts.extend(CRATE_TARGETS.iter().map(|t| format!("{}={}", t, level)));
        parts.join(",")
    }
}

/// Installs the global subscriber. Call once, before the first log line.
///
/// Without an explicit `env_filter`, `RUST_LOG` is honored and
/// [`TracingConfig::default_directive`] is the fallback.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let env_filter = match config.env_filter {
        Some(ref filter) => EnvFilter::try_new(filter)?,
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(config.default_directive()))?,
    };

    let span_events = if config.include_span_events {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_target(config.include_target)
        .with_span_events(span_events);

    let layer = match (config.output_format, config.include_timestamp) {
        (TracingOutputFormat::Compact, true) => layer.compact().boxed(),
        (TracingOutputFormat::Compact, false) => layer.compact().without_time().boxed(),
        (TracingOutputFormat::Pretty, true) => layer.pretty().boxed(),
        (TracingOutputFormat::Pretty, false) => layer.pretty().without_time().boxed(),
        (TracingOutputFormat::Json, _) => layer.json().boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(env_filter).with(layer);
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}
