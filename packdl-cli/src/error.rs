//! CLI error type.

use std::io;

use packdl::catalog::CatalogError;
use packdl::config::ConfigError;
use packdl::download::DownloadError;
use packdl::http::HttpError;
use packdl::update::UpdateError;
use thiserror::Error;

/// Errors surfaced to the user by `packdl` commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Update(#[from] UpdateError),

    #[error("No release with tag '{0}'. Use 'packdl list' to see available releases.")]
    ReleaseNotFound(String),

    #[error("Unknown mirror '{0}'. Use 'packdl mirrors' to see available mirrors.")]
    UnknownMirror(String),

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("Failed to initialise logging: {0}")]
    Logging(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<dialoguer::Error> for CliError {
    fn from(e: dialoguer::Error) -> Self {
        CliError::Prompt(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            CliError::ReleaseNotFound("v1".to_string()).to_string(),
            "No release with tag 'v1'. Use 'packdl list' to see available releases."
        );

        let err: CliError = DownloadError::SizeUnknown {
            url: "https://example.com/a.zip".to_string(),
        }
        .into();
        assert!(err.to_string().starts_with("Download failed: "));
    }
}
