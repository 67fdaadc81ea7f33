//! Shared state of one transfer.
//!
//! A [`TransferControl`] is created per transfer and shared (via `Arc`) by
//! the orchestrator, the chunk workers, the speed sampler and the
//! [`TransferHandle`](super::TransferHandle). It is never reused.
//!
//! Two locks are involved:
//!
//! - the gate (pause / cancel flags) with a condition variable that chunk
//!   workers wait on while paused
//! - the progress counter, the single lock every worker takes to add the
//!   bytes it has written

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Top-level state of a transfer.
///
/// Pausing does not change the phase: a paused transfer is still
/// `Transferring`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    Idle,
    Probing,
    Transferring,
    Completed,
    Failed,
    Stopped,
}

impl TransferPhase {
    /// Whether the transfer has reached a final state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransferPhase::Completed | TransferPhase::Failed | TransferPhase::Stopped
        )
    }
}

#[derive(Debug, Default)]
struct Gate {
    paused: bool,
    /// Workers must stop at their next increment.
    cancelled: bool,
    /// The cancellation came from the caller rather than a failed chunk.
    stop_requested: bool,
}

#[derive(Debug, Default)]
struct Progress {
    total: u64,
    downloaded: u64,
    last_sampled: u64,
}

/// Pause, cancellation and progress state shared by one transfer.
#[derive(Debug)]
pub struct TransferControl {
    gate: Mutex<Gate>,
    gate_changed: Condvar,
    progress: Mutex<Progress>,
    phase: Mutex<TransferPhase>,
    transfer_started: Mutex<Option<Instant>>,
}

impl Default for TransferControl {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferControl {
    pub fn new() -> Self {
        Self {
            gate: Mutex::new(Gate::default()),
            gate_changed: Condvar::new(),
            progress: Mutex::new(Progress::default()),
            phase: Mutex::new(TransferPhase::Idle),
            transfer_started: Mutex::new(None),
        }
    }

    // ---- gate -------------------------------------------------------------

    /// Set the pause flag. Returns `false` if it was already set.
    pub fn pause(&self) -> bool {
        let mut gate = self.gate.lock();
        let changed = !gate.paused;
        gate.paused = true;
        changed
    }

    /// Clear the pause flag and wake blocked workers.
    ///
    /// Returns `false` if the transfer was not paused.
    pub fn resume(&self) -> bool {
        let mut gate = self.gate.lock();
        let changed = gate.paused;
        gate.paused = false;
        self.gate_changed.notify_all();
        changed
    }

    /// Caller-initiated stop: cancel workers and remember why.
    pub fn stop(&self) {
        let mut gate = self.gate.lock();
        gate.cancelled = true;
        gate.stop_requested = true;
        self.gate_changed.notify_all();
    }

    /// Cancel remaining workers after a failure.
    pub fn abort(&self) {
        let mut gate = self.gate.lock();
        gate.cancelled = true;
        self.gate_changed.notify_all();
    }

    pub fn is_paused(&self) -> bool {
        self.gate.lock().paused
    }

    pub fn is_cancelled(&self) -> bool {
        self.gate.lock().cancelled
    }

    pub fn is_stop_requested(&self) -> bool {
        self.gate.lock().stop_requested
    }

    /// Block while paused.
    ///
    /// Returns `true` when the caller may proceed, `false` once the transfer
    /// is cancelled (whether or not it was paused).
    pub fn wait_while_paused(&self) -> bool {
        let mut gate = self.gate.lock();
        while gate.paused && !gate.cancelled {
            self.gate_changed.wait(&mut gate);
        }
        !gate.cancelled
    }

    // ---- progress ---------------------------------------------------------

    /// Record the probed total size.
    pub fn set_total(&self, total: u64) {
        self.progress.lock().total = total;
    }

    pub fn total_bytes(&self) -> u64 {
        self.progress.lock().total
    }

    pub fn downloaded_bytes(&self) -> u64 {
        self.progress.lock().downloaded
    }

    /// Add written bytes to the shared counter.
    ///
    /// The counter never exceeds the total. Returns `(downloaded, total)`
    /// as seen under the lock.
    pub fn add_downloaded(&self, bytes: u64) -> (u64, u64) {
        let mut progress = self.progress.lock();
        progress.downloaded = progress.downloaded.saturating_add(bytes).min(progress.total);
        (progress.downloaded, progress.total)
    }

    /// Bytes written since the previous sample.
    ///
    /// Returns `None` while paused; the sample point still advances so the
    /// first sample after resuming does not include pre-pause bytes.
    pub fn take_sample(&self) -> Option<u64> {
        let paused = self.is_paused();
        let mut progress = self.progress.lock();
        let delta = progress.downloaded - progress.last_sampled;
        progress.last_sampled = progress.downloaded;
        (!paused).then_some(delta)
    }

    // ---- phase ------------------------------------------------------------

    pub fn phase(&self) -> TransferPhase {
        *self.phase.lock()
    }

    /// Entering [`TransferPhase::Transferring`] starts the elapsed-time clock.
    pub fn set_phase(&self, phase: TransferPhase) {
        if phase == TransferPhase::Transferring {
            self.transfer_started.lock().get_or_insert_with(Instant::now);
        }
        *self.phase.lock() = phase;
    }

    /// Time spent since the transfer entered [`TransferPhase::Transferring`].
    ///
    /// Zero while probing or when the transfer never started.
    pub fn elapsed(&self) -> Duration {
        self.transfer_started
            .lock()
            .map_or(Duration::ZERO, |started| started.elapsed())
    }
}

/// Integer percentage, truncated: `floor(downloaded / total * 100)`.
pub fn percent(downloaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    ((u128::from(downloaded) * 100) / u128::from(total)).min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_percent_truncates() {
        assert_eq!(percent(0, 1000), 0);
        assert_eq!(percent(999, 1000), 99);
        assert_eq!(percent(1000, 1000), 100);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(5, 0), 0);
        assert_eq!(percent(u64::MAX, u64::MAX), 100);
    }

    #[test]
    fn test_counter_is_capped_at_total() {
        let control = TransferControl::new();
        control.set_total(100);

        assert_eq!(control.add_downloaded(60), (60, 100));
        assert_eq!(control.add_downloaded(60), (100, 100));
        assert_eq!(control.downloaded_bytes(), 100);
    }

    #[test]
    fn test_pause_resume_flags() {
        let control = TransferControl::new();

        assert!(control.pause());
        assert!(!control.pause());
        assert!(control.is_paused());
        assert!(control.resume());
        assert!(!control.resume());
        assert!(!control.is_paused());
    }

    #[test]
    fn test_wait_while_paused_unblocks_on_resume() {
        let control = Arc::new(TransferControl::new());
        control.pause();

        let waiter = {
            let control = Arc::clone(&control);
            thread::spawn(move || control.wait_while_paused())
        };

        thread::sleep(Duration::from_millis(20));
        assert!(!waiter.is_finished());

        control.resume();
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_wait_while_paused_unblocks_on_stop() {
        let control = Arc::new(TransferControl::new());
        control.pause();

        let waiter = {
            let control = Arc::clone(&control);
            thread::spawn(move || control.wait_while_paused())
        };

        thread::sleep(Duration::from_millis(20));
        control.stop();

        assert!(!waiter.join().unwrap());
        assert!(control.is_stop_requested());
    }

    #[test]
    fn test_abort_is_not_a_stop_request() {
        let control = TransferControl::new();
        control.abort();

        assert!(control.is_cancelled());
        assert!(!control.is_stop_requested());
        assert!(!control.wait_while_paused());
    }

    #[test]
    fn test_sample_skipped_while_paused() {
        let control = TransferControl::new();
        control.set_total(1000);

        control.add_downloaded(100);
        assert_eq!(control.take_sample(), Some(100));

        control.add_downloaded(50);
        control.pause();
        assert_eq!(control.take_sample(), None);

        control.resume();
        control.add_downloaded(25);
        assert_eq!(control.take_sample(), Some(25));
    }

    #[test]
    fn test_phase_transitions() {
        let control = TransferControl::new();
        assert_eq!(control.phase(), TransferPhase::Idle);
        assert!(!control.phase().is_terminal());

        control.set_phase(TransferPhase::Completed);
        assert!(control.phase().is_terminal());
    }

    #[test]
    fn test_elapsed_counts_from_transferring() {
        let overall = Instant::now();
        let control = TransferControl::new();
        control.set_phase(TransferPhase::Probing);
        thread::sleep(Duration::from_millis(60));
        assert_eq!(control.elapsed(), Duration::ZERO);

        control.set_phase(TransferPhase::Transferring);
        thread::sleep(Duration::from_millis(20));
        control.set_phase(TransferPhase::Completed);

        let elapsed = control.elapsed();
        assert!(elapsed >= Duration::from_millis(20));
        assert!(elapsed + Duration::from_millis(60) <= overall.elapsed());
    }
}
