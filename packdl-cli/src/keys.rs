//! Single-key transfer controls while a download runs.
//!
//! `p` or space toggles pause; `q`, Esc or Ctrl+C stops. Raw mode is enabled
//! only while a [`KeyControls`] is alive and is restored when it drops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use packdl::download::TransferRemote;
use tracing::{debug, warn};

/// How often the listener rechecks whether the transfer has ended.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    TogglePause,
    Stop,
}

/// Map a key press to a transfer action.
pub fn key_action(key: &KeyEvent) -> Option<KeyAction> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(KeyAction::Stop)
        }
        KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::Char(' ') => {
            Some(KeyAction::TogglePause)
        }
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(KeyAction::Stop),
        _ => None,
    }
}

/// Keyboard listener bound to one transfer.
pub struct KeyControls {
    done: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl KeyControls {
    /// Put the terminal in raw mode and start listening.
    ///
    /// Returns `None` when the terminal cannot enter raw mode.
    pub fn start(remote: TransferRemote) -> Option<Self> {
        if let Err(e) = terminal::enable_raw_mode() {
            debug!(error = %e, "Raw mode unavailable, keyboard controls disabled");
            return None;
        }

        let done = Arc::new(AtomicBool::new(false));
        let spawned = {
            let done = Arc::clone(&done);
            thread::Builder::new()
                .name("key-controls".to_string())
                .spawn(move || listen(&remote, &done))
        };

        match spawned {
            Ok(thread) => Some(Self {
                done,
                thread: Some(thread),
            }),
            Err(e) => {
                let _ = terminal::disable_raw_mode();
                warn!(error = %e, "Failed to start keyboard listener");
                None
            }
        }
    }
}

impl Drop for KeyControls {
    fn drop(&mut self) {
        self.done.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            thread.join().ok();
        }
        let _ = terminal::disable_raw_mode();
    }
}

fn listen(remote: &TransferRemote, done: &AtomicBool) {
    while !done.load(Ordering::Relaxed) && !remote.phase().is_terminal() {
        match event::poll(POLL_INTERVAL) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                warn!(error = %e, "Keyboard input unavailable");
                return;
            }
        }

        let Ok(Event::Key(key)) = event::read() else {
            continue;
        };
        match key_action(&key) {
            Some(KeyAction::TogglePause) => {
                let paused = remote.toggle_pause();
                debug!(paused, "Pause toggled from keyboard");
            }
            Some(KeyAction::Stop) => {
                remote.stop();
                return;
            }
            None => {}
        }
    }
}
