//! Error types for transfers.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::http::HttpError;

/// Result type for download operations.
pub type DownloadResult<T> = Result<T, DownloadError>;

/// Errors that can occur during a transfer.
///
/// Any of these is fatal to the whole transfer; the partially written file
/// is left on disk.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The size probe failed at the transport or HTTP level.
    #[error("network error: {0}")]
    Network(#[from] HttpError),

    /// The probe succeeded but the server reported no usable length.
    #[error("server did not report a file size for {url}")]
    SizeUnknown { url: String },

    /// A byte-range request failed after the transfer began.
    #[error("chunk {index} (bytes {start}-{end}) failed: {reason}")]
    Chunk {
        index: usize,
        start: u64,
        end: u64,
        reason: String,
    },

    /// The destination file could not be created or written.
    #[error("failed to write {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    /// A chunk worker thread panicked.
    #[error("chunk worker {0} panicked")]
    WorkerPanicked(usize),

    /// The transfer thread itself panicked.
    #[error("transfer thread panicked")]
    EnginePanicked,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_chunk_error_display() {
        let err = DownloadError::Chunk {
            index: 2,
            start: 100,
            end: 199,
            reason: "HTTP 500 from https://example.com/a.zip".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "chunk 2 (bytes 100-199) failed: HTTP 500 from https://example.com/a.zip"
        );
    }

    #[test]
    fn test_io_error_has_source() {
        let err = DownloadError::Io {
            path: PathBuf::from("/tmp/pack.zip"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().starts_with("failed to write /tmp/pack.zip"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_size_unknown_display() {
        let err = DownloadError::SizeUnknown {
            url: "https://example.com/a.zip".to_string(),
        };
        assert!(err.to_string().contains("did not report a file size"));
    }
}
