//! Subcommand implementations.

#[cfg(feature = "google")]
pub mod auth;
pub mod config;
pub mod sync;
