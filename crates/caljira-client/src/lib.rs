//! CLI, prompts, and the calendar-to-worklog pipeline
//!
//! This crate provides the `caljira` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod extract;
pub mod prompt;
pub mod review;
pub mod secret;
pub mod submit;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
