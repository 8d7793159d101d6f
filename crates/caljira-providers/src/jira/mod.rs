//! Jira worklog tracker.
//!
//! Reads and creates worklogs through the Jira REST API using HTTP Basic
//! authentication.

mod client;
mod config;

pub use client::JiraClient;
pub use config::JiraConfig;
