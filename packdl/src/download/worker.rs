//! Chunk worker: fetches one byte range and writes it in place.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use super::control::{percent, TransferControl};
use super::error::{DownloadError, DownloadResult};
use super::events::{DownloadEvent, DownloadObserver};
use super::partition::ChunkRange;
use crate::http::HttpTransport;

/// Bytes read and written per increment.
pub const INCREMENT_SIZE: usize = 8 * 1024;

/// How a worker finished without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// The whole range was written.
    Finished { bytes: u64 },
    /// The transfer was cancelled before the range was complete.
    Cancelled { bytes: u64 },
}

/// Everything a worker thread needs to fetch one range.
pub(crate) struct ChunkJob {
    pub transport: Arc<dyn HttpTransport>,
    pub url: String,
    pub destination: PathBuf,
    pub range: ChunkRange,
    pub total_bytes: u64,
    pub control: Arc<TransferControl>,
    pub observer: Arc<dyn DownloadObserver>,
}

impl ChunkJob {
    /// Run the job; on failure, cancel the remaining workers.
    pub fn run(self) -> DownloadResult<ChunkOutcome> {
        let result = self.transfer();
        if let Err(e) = &result {
            warn!(chunk = self.range.index, error = %e, "Chunk failed, cancelling transfer");
            self.control.abort();
        }
        result
    }

    fn chunk_error(&self, reason: impl Into<String>) -> DownloadError {
        DownloadError::Chunk {
            index: self.range.index,
            start: self.range.start,
            end: self.range.end,
            reason: reason.into(),
        }
    }

    fn io_error(&self, source: std::io::Error) -> DownloadError {
        DownloadError::Io {
            path: self.destination.clone(),
            source,
        }
    }

    fn transfer(&self) -> DownloadResult<ChunkOutcome> {
        let range = self.range;
        if self.control.is_cancelled() {
            return Ok(ChunkOutcome::Cancelled { bytes: 0 });
        }

        let mut response = self
            .transport
            .get_range(&self.url, range.start, range.end)
            .map_err(|e| self.chunk_error(e.to_string()))?;

        // A full-body response is only usable when it is exactly our range.
        let whole_file = range.start == 0 && range.end + 1 == self.total_bytes;
        if !response.is_partial() && !whole_file {
            return Err(self.chunk_error(format!(
                "server ignored the range request (HTTP {})",
                response.status
            )));
        }

        let mut file = OpenOptions::new()
            .write(true)
            .open(&self.destination)
            .map_err(|e| self.io_error(e))?;
        file.seek(SeekFrom::Start(range.start))
            .map_err(|e| self.io_error(e))?;

        let mut buffer = vec![0u8; INCREMENT_SIZE];
        let mut written = 0u64;
        let expected = range.len();

        while written < expected {
            let want = (expected - written).min(INCREMENT_SIZE as u64) as usize;
            let read = match response.body.read(&mut buffer[..want]) {
                Ok(0) => {
                    return Err(self.chunk_error(format!(
                        "connection closed after {} of {} bytes",
                        written, expected
                    )))
                }
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.chunk_error(format!("read error: {}", e))),
            };

            if !self.control.wait_while_paused() {
                debug!(chunk = range.index, written, "Chunk cancelled");
                return Ok(ChunkOutcome::Cancelled { bytes: written });
            }

            file.write_all(&buffer[..read])
                .map_err(|e| self.io_error(e))?;
            written += read as u64;

            let (downloaded, total) = self.control.add_downloaded(read as u64);
            self.observer.on_event(DownloadEvent::Progress {
                percent: percent(downloaded, total),
                downloaded_bytes: downloaded,
                total_bytes: total,
            });
        }

        file.flush().map_err(|e| self.io_error(e))?;
        debug!(chunk = range.index, bytes = written, "Chunk finished");
        Ok(ChunkOutcome::Finished { bytes: written })
    }
}
