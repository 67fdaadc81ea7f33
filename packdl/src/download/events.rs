//! Transfer events and observers.
//!
//! The engine publishes [`DownloadEvent`]s to a [`DownloadObserver`] and
//! knows nothing about how they are displayed. Closures and channels both
//! work as observers:
//!
//! ```
//! use std::sync::mpsc;
//! use packdl::download::{ChannelObserver, DownloadEvent, DownloadObserver};
//!
//! let log = |event: DownloadEvent| println!("{:?}", event);
//! log.on_event(DownloadEvent::Paused);
//!
//! let (tx, rx) = mpsc::channel();
//! ChannelObserver::new(tx).on_event(DownloadEvent::Resumed);
//! assert_eq!(rx.recv().unwrap(), DownloadEvent::Resumed);
//! ```

use std::path::PathBuf;
use std::sync::mpsc::Sender;

use parking_lot::Mutex;

/// Something that happened during a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadEvent {
    /// The size probe succeeded and workers are about to start.
    Started { total_bytes: u64, threads: usize },

    /// A worker wrote an increment.
    Progress {
        percent: u8,
        downloaded_bytes: u64,
        total_bytes: u64,
    },

    /// Periodic throughput sample (not emitted while paused).
    Speed { bytes_per_sec: u64, display: String },

    Paused,
    Resumed,

    /// All bytes were written.
    Finished { path: PathBuf },

    /// The transfer failed; the message is meant for humans.
    Failed { message: String },
}

/// Receiver of transfer events.
///
/// Called from worker and sampler threads; implementations must be cheap
/// and must not block for long.
pub trait DownloadObserver: Send + Sync {
    fn on_event(&self, event: DownloadEvent);
}

impl<F> DownloadObserver for F
where
    F: Fn(DownloadEvent) + Send + Sync,
{
    fn on_event(&self, event: DownloadEvent) {
        self(event)
    }
}

/// Observer that forwards events into an `mpsc` channel.
///
/// Send errors (receiver dropped) are ignored.
#[derive(Debug)]
pub struct ChannelObserver {
    sender: Mutex<Sender<DownloadEvent>>,
}

impl ChannelObserver {
    pub fn new(sender: Sender<DownloadEvent>) -> Self {
        Self {
            sender: Mutex::new(sender),
        }
    }
}

impl DownloadObserver for ChannelObserver {
    fn on_event(&self, event: DownloadEvent) {
        let _ = self.sender.lock().send(event);
    }
}

/// Observer that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DownloadObserver for NoopObserver {
    fn on_event(&self, _event: DownloadEvent) {}
}
