//! Concurrent range download engine.
//!
//! A transfer probes the resource size, splits it into contiguous byte
//! ranges and fetches each range on its own thread, writing straight into
//! a pre-sized destination file.
//!
//! # Architecture
//!
//! ```text
//! DownloadEngine::spawn ──► TransferHandle (pause / resume / stop / wait)
//!         │
//!         └── DownloadEngine::run (orchestrator thread)
//!                 │
//!                 ├── HttpTransport::content_length (probe)
//!                 ├── partition (ChunkRange per worker)
//!                 ├── ChunkJob × N (one thread per range)
//!                 ├── SpeedSampler (periodic throughput)
//!                 │
//!                 └── TransferControl (shared pause gate + byte counter)
//! ```
//!
//! Events are published to a [`DownloadObserver`]; the engine has no idea
//! how (or whether) they are displayed.

mod control;
mod engine;
mod error;
mod events;
mod partition;
mod sampler;
mod worker;

pub use control::{percent, TransferControl, TransferPhase};
pub use engine::{
    DownloadEngine, TransferHandle, TransferOutcome, TransferRemote, TransferRequest,
    DEFAULT_THREADS,
};
pub use error::{DownloadError, DownloadResult};
pub use events::{ChannelObserver, DownloadEvent, DownloadObserver, NoopObserver};
pub use partition::{clamp_threads, partition, ChunkRange, MAX_THREADS, MIN_THREADS};
pub use sampler::DEFAULT_SAMPLE_INTERVAL;
pub use worker::{ChunkOutcome, INCREMENT_SIZE};
