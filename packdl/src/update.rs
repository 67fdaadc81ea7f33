//! Application update check.
//!
//! Compares the tag of the newest published application release with the
//! running version. This is a plain digit-run comparison, unrelated to the
//! release catalog's [`sort_key`](crate::version::sort_key) ordering.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::LatestRelease;
use crate::config::DEFAULT_UPDATE_URL;
use crate::http::{HttpError, HttpTransport};
use crate::version::numeric_components;

/// Result type for update checks.
pub type UpdateResult<T> = Result<T, UpdateError>;

/// Errors from the update check.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpdateError {
    #[error("failed to check for updates: {0}")]
    Network(#[from] HttpError),

    #[error("invalid latest-release response from {url}: {reason}")]
    Parse { url: String, reason: String },
}

/// Outcome of an update check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    /// A newer release exists.
    Available {
        /// Latest version, without a leading `v`.
        latest: String,
        /// Release page for the user to open.
        page_url: String,
    },
    UpToDate,
}

/// Whether `latest` is newer than `current`.
///
/// Digit runs are compared left to right as integers; a longer sequence
/// wins when one is a prefix of the other. Strings without digits compare
/// as an empty sequence.
///
/// ```
/// use packdl::update::is_newer_version;
///
/// assert!(is_newer_version("1.10.0", "1.9.3"));
/// assert!(is_newer_version("2.0.1", "2.0"));
/// assert!(!is_newer_version("1.0", "1.0"));
/// ```
pub fn is_newer_version(latest: &str, current: &str) -> bool {
    let latest = numeric_components(latest).unwrap_or_default();
    let current = numeric_components(current).unwrap_or_default();
    latest > current
}

/// Checks a "latest release" endpoint for a newer application version.
pub struct UpdateChecker {
    transport: Arc<dyn HttpTransport>,
    url: String,
}

impl UpdateChecker {
    /// Create a checker for the default endpoint.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_url(transport, DEFAULT_UPDATE_URL)
    }

    pub fn with_url(transport: Arc<dyn HttpTransport>, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the latest release and compare it with `current_version`.
    pub fn check(&self, current_version: &str) -> UpdateResult<UpdateStatus> {
        debug!(url = %self.url, "Checking for updates");
        let response = self.transport.get(&self.url)?;

        let release: LatestRelease =
            serde_json::from_slice(&response.body).map_err(|e| self.parse_error(e.to_string()))?;

        let latest = release.tag_name.trim().trim_start_matches('v');
        if latest.is_empty() {
            return Err(self.parse_error("empty tag_name"));
        }

        if is_newer_version(latest, current_version) {
            info!(latest, current = current_version, "Update available");
            Ok(UpdateStatus::Available {
                latest: latest.to_string(),
                page_url: release.html_url,
            })
        } else {
            Ok(UpdateStatus::UpToDate)
        }
    }

    fn parse_error(&self, reason: impl Into<String>) -> UpdateError {
        UpdateError::Parse {
            url: self.url.clone(),
            reason: reason.into(),
        }
    }
}
