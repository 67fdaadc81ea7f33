//! packdl - Modpack release catalog and multi-threaded downloader
//!
//! This library provides the core of the packdl download manager:
//!
//! - [`catalog`]: walks a paginated release listing API and groups matching
//!   release assets into a per-platform-version catalog
//! - [`version`]: ordering of release tags and platform-version labels
//! - [`mirror`]: rewriting of canonical URLs through alternate mirror endpoints
//! - [`download`]: parallel, range-partitioned transfers with pause, resume
//!   and stop control
//! - [`config`]: the INI settings file shared with the CLI
//! - [`update`]: checks whether a newer application release exists
//!
//! Presentation (terminal UI, dialogs) lives in the `packdl-cli` crate; this
//! crate only publishes events and returns typed results.

pub mod catalog;
pub mod config;
pub mod download;
pub mod format;
pub mod http;
pub mod mirror;
pub mod update;
pub mod version;

/// Version of the packdl library, used for update checks and the user agent.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
