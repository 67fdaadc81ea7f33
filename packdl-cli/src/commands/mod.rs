//! Subcommand implementations.

pub mod common;
pub mod config;
pub mod download;
pub mod list;
pub mod mirrors;
pub mod notes;
pub mod update;
pub mod url;
