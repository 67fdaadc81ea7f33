//! Wire types for the release listing API.
//!
//! Pages are decoded straight into these records; a missing required field
//! fails the whole page with a structured [`CatalogError::Parse`].

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::error::{CatalogError, CatalogResult};

/// One downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiAsset {
    pub name: String,
    pub browser_download_url: String,
    pub size: u64,
}

/// One release object from the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiRelease {
    pub tag_name: String,
    #[serde(default)]
    pub prerelease: bool,
    pub published_at: DateTime<Utc>,
    /// Release notes; the API sends `null` for releases without notes.
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub assets: Vec<ApiAsset>,
}

/// The single object returned by a "latest release" endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LatestRelease {
    pub tag_name: String,
    #[serde(default)]
    pub html_url: String,
}

/// Decode one page of the release listing.
pub(crate) fn decode_page(url: &str, body: &[u8]) -> CatalogResult<Vec<ApiRelease>> {
    serde_json::from_slice(body).map_err(|e| CatalogError::Parse {
        url: url.to_string(),
        reason: e.to_string(),
    })
}
