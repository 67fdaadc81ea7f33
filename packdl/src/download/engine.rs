//! Transfer orchestration.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info};

use super::control::{TransferControl, TransferPhase};
use super::error::{DownloadError, DownloadResult};
use super::events::{DownloadEvent, DownloadObserver};
use super::partition::{clamp_threads, partition};
use super::sampler::{SpeedSampler, DEFAULT_SAMPLE_INTERVAL};
use super::worker::{ChunkJob, ChunkOutcome};
use crate::http::HttpTransport;

/// Worker count used when the caller does not choose one.
pub const DEFAULT_THREADS: usize = 4;

/// What to download and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Final (already mirror-rewritten) URL.
    pub url: String,
    pub destination: PathBuf,
    /// Requested worker count; clamped to 1..=64 when the transfer starts.
    pub threads: usize,
}

impl TransferRequest {
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
            threads: DEFAULT_THREADS,
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }
}

/// How a transfer ended without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Completed { path: PathBuf, bytes: u64 },
    /// Stopped by the caller; the partial file stays on disk.
    Stopped { downloaded_bytes: u64 },
}

/// Parallel range-partitioned downloader.
///
/// # Example
///
/// ```ignore
/// let engine = DownloadEngine::new(Arc::new(ReqwestTransport::new()?));
/// let handle = engine.spawn(
///     TransferRequest::new(url, "/tmp/pack.zip").with_threads(8),
///     Arc::new(|event: DownloadEvent| println!("{:?}", event)),
/// );
/// handle.pause();
/// handle.resume();
/// let outcome = handle.wait()?;
/// ```
#[derive(Clone)]
pub struct DownloadEngine {
    transport: Arc<dyn HttpTransport>,
    sample_interval: Duration,
}

impl DownloadEngine {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }

    /// Override the speed sampling interval (one second by default).
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Start a transfer on a background thread.
    pub fn spawn(
        &self,
        request: TransferRequest,
        observer: Arc<dyn DownloadObserver>,
    ) -> TransferHandle {
        let control = Arc::new(TransferControl::new());
        let engine = self.clone();
        let thread = {
            let control = Arc::clone(&control);
            let observer = Arc::clone(&observer);
            thread::spawn(move || engine.run(&request, control, observer))
        };

        TransferHandle {
            remote: TransferRemote { control, observer },
            thread: Some(thread),
        }
    }

    /// Run a transfer to completion on the calling thread.
    ///
    /// `control` may be shared with other threads to pause, resume or stop
    /// the transfer while it runs. On error a [`DownloadEvent::Failed`] is
    /// emitted and the phase becomes [`TransferPhase::Failed`].
    pub fn run(
        &self,
        request: &TransferRequest,
        control: Arc<TransferControl>,
        observer: Arc<dyn DownloadObserver>,
    ) -> DownloadResult<TransferOutcome> {
        match self.execute(request, &control, &observer) {
            Ok(outcome) => {
                match &outcome {
                    TransferOutcome::Completed { path, bytes } => {
                        info!(
                            path = %path.display(),
                            bytes,
                            elapsed_secs = control.elapsed().as_secs_f64(),
                            "Download complete"
                        );
                        control.set_phase(TransferPhase::Completed);
                        observer.on_event(DownloadEvent::Finished { path: path.clone() });
                    }
                    TransferOutcome::Stopped { downloaded_bytes } => {
                        info!(downloaded_bytes, "Download stopped");
                        control.set_phase(TransferPhase::Stopped);
                    }
                }
                Ok(outcome)
            }
            Err(e) => {
                error!(url = %request.url, error = %e, "Download failed");
                control.set_phase(TransferPhase::Failed);
                observer.on_event(DownloadEvent::Failed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn execute(
        &self,
        request: &TransferRequest,
        control: &Arc<TransferControl>,
        observer: &Arc<dyn DownloadObserver>,
    ) -> DownloadResult<TransferOutcome> {
        control.set_phase(TransferPhase::Probing);
        debug!(url = %request.url, "Probing size");

        let total = match self.transport.content_length(&request.url)? {
            Some(len) if len > 0 => len,
            _ => {
                return Err(DownloadError::SizeUnknown {
                    url: request.url.clone(),
                })
            }
        };

        if control.is_stop_requested() {
            return Ok(TransferOutcome::Stopped {
                downloaded_bytes: 0,
            });
        }

        let ranges = partition(total, clamp_threads(request.threads));
        prepare_destination(&request.destination, total)?;

        control.set_total(total);
        control.set_phase(TransferPhase::Transferring);
        info!(
            url = %request.url,
            total_bytes = total,
            threads = ranges.len(),
            "Starting download"
        );
        observer.on_event(DownloadEvent::Started {
            total_bytes: total,
            threads: ranges.len(),
        });

        let sampler = SpeedSampler::start(
            Arc::clone(control),
            Arc::clone(observer),
            self.sample_interval,
        );

        let handles: Vec<(usize, JoinHandle<DownloadResult<ChunkOutcome>>)> = ranges
            .into_iter()
            .map(|range| {
                let job = ChunkJob {
                    transport: Arc::clone(&self.transport),
                    url: request.url.clone(),
                    destination: request.destination.clone(),
                    range,
                    total_bytes: total,
                    control: Arc::clone(control),
                    observer: Arc::clone(observer),
                };
                (range.index, thread::spawn(move || job.run()))
            })
            .collect();

        let mut first_error = None;
        for (index, handle) in handles {
            let result = handle.join().unwrap_or_else(|_| {
                control.abort();
                Err(DownloadError::WorkerPanicked(index))
            });
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }

        sampler.stop();

        if control.is_stop_requested() {
            return Ok(TransferOutcome::Stopped {
                downloaded_bytes: control.downloaded_bytes(),
            });
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        // Finished while paused: conclude only once resumed or stopped.
        if !control.wait_while_paused() {
            return Ok(TransferOutcome::Stopped {
                downloaded_bytes: control.downloaded_bytes(),
            });
        }

        Ok(TransferOutcome::Completed {
            path: request.destination.clone(),
            bytes: total,
        })
    }
}

/// Create parent directories and a file pre-sized to `total` bytes.
fn prepare_destination(path: &Path, total: u64) -> DownloadResult<()> {
    let io_error = |source| DownloadError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let file = File::create(path).map_err(io_error)?;
    file.set_len(total).map_err(io_error)?;
    Ok(())
}

/// Cloneable pause, resume and stop access to a running transfer.
///
/// Obtained from [`TransferHandle::remote`] for use on other threads, such as
/// a keyboard listener; pause and resume publish the same events as the
/// handle does.
#[derive(Clone)]
pub struct TransferRemote {
    control: Arc<TransferControl>,
    observer: Arc<dyn DownloadObserver>,
}

impl TransferRemote {
    /// Block all workers at their next increment.
    ///
    /// Returns `false` if already paused or finished.
    pub fn pause(&self) -> bool {
        if self.control.phase().is_terminal() || !self.control.pause() {
            return false;
        }
        self.observer.on_event(DownloadEvent::Paused);
        true
    }

    /// Let paused workers continue from where they stopped.
    pub fn resume(&self) -> bool {
        if !self.control.resume() {
            return false;
        }
        self.observer.on_event(DownloadEvent::Resumed);
        true
    }

    /// Pause a running transfer or resume a paused one.
    ///
    /// Returns whether the transfer is paused afterwards.
    pub fn toggle_pause(&self) -> bool {
        if self.control.is_paused() {
            self.resume();
        } else {
            self.pause();
        }
        self.control.is_paused()
    }

    /// Request cancellation without waiting for the workers.
    pub fn stop(&self) {
        self.control.stop();
    }

    pub fn phase(&self) -> TransferPhase {
        self.control.phase()
    }

    pub fn is_paused(&self) -> bool {
        self.control.is_paused()
    }
}

impl std::fmt::Debug for TransferRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferRemote")
            .field("phase", &self.control.phase())
            .field("paused", &self.control.is_paused())
            .finish_non_exhaustive()
    }
}

/// Control surface for a transfer started with [`DownloadEngine::spawn`].
///
/// Dropping the handle stops the transfer and waits for it.
pub struct TransferHandle {
    remote: TransferRemote,
    thread: Option<JoinHandle<DownloadResult<TransferOutcome>>>,
}

impl TransferHandle {
    /// Block all workers at their next increment.
    ///
    /// Returns `false` if already paused or finished.
    pub fn pause(&self) -> bool {
        self.remote.pause()
    }

    /// Let paused workers continue from where they stopped.
    pub fn resume(&self) -> bool {
        self.remote.resume()
    }

    /// Cancel the transfer and wait for every worker to exit.
    pub fn stop(mut self) -> DownloadResult<TransferOutcome> {
        self.remote.stop();
        self.join()
    }

    /// Wait for the transfer to end on its own.
    pub fn wait(mut self) -> DownloadResult<TransferOutcome> {
        self.join()
    }

    /// Shared state, for stopping from another thread (e.g. a signal handler).
    pub fn control(&self) -> Arc<TransferControl> {
        Arc::clone(&self.remote.control)
    }

    /// Pause, resume and stop access that can move to another thread.
    pub fn remote(&self) -> TransferRemote {
        self.remote.clone()
    }

    pub fn phase(&self) -> TransferPhase {
        self.remote.phase()
    }

    pub fn is_paused(&self) -> bool {
        self.remote.is_paused()
    }

    pub fn downloaded_bytes(&self) -> u64 {
        self.remote.control.downloaded_bytes()
    }

    pub fn total_bytes(&self) -> u64 {
        self.remote.control.total_bytes()
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    fn join(&mut self) -> DownloadResult<TransferOutcome> {
        match self.thread.take() {
            Some(thread) => thread.join().unwrap_or(Err(DownloadError::EnginePanicked)),
            None => Err(DownloadError::EnginePanicked),
        }
    }
}

impl Drop for TransferHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.remote.stop();
            thread.join().ok();
        }
    }
}

impl std::fmt::Debug for TransferHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferHandle")
            .field("phase", &self.remote.phase())
            .field("paused", &self.remote.is_paused())
            .finish_non_exhaustive()
    }
}
