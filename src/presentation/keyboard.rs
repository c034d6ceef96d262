//! Raw keystroke input.
//!
//! Reads happen on a dedicated thread that owns raw mode for its whole
//! lifetime and forwards key events to the async control loop.

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEvent};
use crossterm::terminal;
use std::io::{self, IsTerminal};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error};

/// How often the reader thread checks for a shutdown request
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Refuse to run where single keystrokes cannot be read.
pub fn check_supported() -> Result<(), &'static str> {
    if !cfg!(unix) {
        return Err("This program requires a Unix-like environment (Mac/Linux).");
    }
    if !io::stdin().is_terminal() {
        return Err("Keyboard control needs an interactive terminal on stdin.");
    }
    Ok(())
}

/// Keeps the terminal in raw mode until dropped
pub struct RawModeGuard;

impl RawModeGuard {
    pub fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            error!("Failed to restore terminal mode: {}", e);
        }
    }
}

/// Background keystroke reader
pub struct KeyReader {
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl KeyReader {
    /// Switch the terminal to raw mode and start forwarding key presses
    pub fn spawn() -> Result<(Self, mpsc::UnboundedReceiver<KeyEvent>)> {
        let guard = RawModeGuard::enable().context("Failed to enable raw terminal mode")?;
        let (tx, rx) = mpsc::unbounded_channel();
        let stop = Arc::new(AtomicBool::new(false));

        let thread_stop = stop.clone();
        let handle = std::thread::Builder::new()
            .name("key-reader".to_string())
            .spawn(move || {
                let _guard = guard;
                read_keys(tx, &thread_stop);
            })
            .context("Failed to spawn keyboard thread")?;

        Ok((
            Self {
                handle: Some(handle),
                stop,
            },
            rx,
        ))
    }

    /// Stop the reader and restore the terminal
    pub fn shutdown(mut self) {
        self.join();
    }

    fn join(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Keyboard thread panicked");
            }
        }
    }
}

impl Drop for KeyReader {
    fn drop(&mut self) {
        self.join();
    }
}

fn read_keys(tx: mpsc::UnboundedSender<KeyEvent>, stop: &AtomicBool) {
    while !stop.load(Ordering::Relaxed) {
        match event::poll(POLL_INTERVAL) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) => {
                    debug!("Key event: {:?}", key);
                    if tx.send(key).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!("Keyboard read failed: {}", e);
                    break;
                }
            },
            Ok(false) => {}
            Err(e) => {
                error!("Keyboard poll failed: {}", e);
                break;
            }
        }
    }
}
