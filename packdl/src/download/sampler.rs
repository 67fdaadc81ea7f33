//! Periodic throughput sampling.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::control::TransferControl;
use super::events::{DownloadEvent, DownloadObserver};
use crate::format::format_speed;

/// Default interval between speed samples.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    changed: Condvar,
}

/// Background thread that emits [`DownloadEvent::Speed`] once per interval.
///
/// Samples are skipped while the transfer is paused. The thread stops on
/// [`stop`](Self::stop) or when the sampler is dropped.
pub struct SpeedSampler {
    handle: Option<JoinHandle<()>>,
    signal: Arc<StopSignal>,
}

impl SpeedSampler {
    pub fn start(
        control: Arc<TransferControl>,
        observer: Arc<dyn DownloadObserver>,
        interval: Duration,
    ) -> Self {
        let signal = Arc::new(StopSignal::default());
        let thread_signal = Arc::clone(&signal);
        let interval = interval.max(Duration::from_millis(1));

        let handle = thread::spawn(move || {
            let mut deadline = Instant::now() + interval;
            let mut stopped = thread_signal.stopped.lock();
            loop {
                while !*stopped && Instant::now() < deadline {
                    thread_signal.changed.wait_until(&mut stopped, deadline);
                }
                if *stopped {
                    break;
                }
                deadline += interval;

                if let Some(delta) = control.take_sample() {
                    let bytes_per_sec =
                        (u128::from(delta) * 1000 / interval.as_millis().max(1)) as u64;
                    observer.on_event(DownloadEvent::Speed {
                        bytes_per_sec,
                        display: format_speed(bytes_per_sec),
                    });
                }
            }
        });

        Self {
            handle: Some(handle),
            signal,
        }
    }

    /// Stop the sampler and wait for its thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        {
            let mut stopped = self.signal.stopped.lock();
            *stopped = true;
            self.signal.changed.notify_all();
        }
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
    }
}

impl Drop for SpeedSampler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    use crate::download::events::ChannelObserver;

    #[test]
    fn test_sampler_emits_speed() {
        let control = Arc::new(TransferControl::new());
        control.set_total(1_000_000);
        let (tx, rx) = mpsc::channel();

        let sampler = SpeedSampler::start(
            Arc::clone(&control),
            Arc::new(ChannelObserver::new(tx)),
            Duration::from_millis(20),
        );
        control.add_downloaded(2048);

        let event = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        sampler.stop();

        match event {
            DownloadEvent::Speed { display, .. } => assert!(display.ends_with("/s")),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_sampler_silent_while_paused() {
        let control = Arc::new(TransferControl::new());
        control.set_total(1000);
        control.pause();
        let (tx, rx) = mpsc::channel();

        let sampler = SpeedSampler::start(
            Arc::clone(&control),
            Arc::new(ChannelObserver::new(tx)),
            Duration::from_millis(10),
        );
        thread::sleep(Duration::from_millis(60));
        sampler.stop();

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_sampler_stops_promptly() {
        let control = Arc::new(TransferControl::new());
        let sampler = SpeedSampler::start(
            control,
            Arc::new(crate::download::events::NoopObserver),
            Duration::from_secs(60),
        );

        let started = Instant::now();
        drop(sampler);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
