//! Error types for catalog resolution.

use thiserror::Error;

use crate::http::HttpError;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur while building a release catalog.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// A page request failed at the transport or HTTP level.
    #[error("failed to fetch release listing: {0}")]
    Network(#[from] HttpError),

    /// A page body did not match the release listing schema.
    #[error("failed to parse release listing from {url}: {reason}")]
    Parse { url: String, reason: String },
}
