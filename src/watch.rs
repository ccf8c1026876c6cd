//! Rescan on markdown changes.
//!
//! The watcher thread owns no model state: every settled burst of events
//! triggers a full scan whose result is sent to the caller as-is.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::SpecGroup;
use crate::scanner::scan;

/// One message per rescan.
pub type ScanUpdate = Result<Vec<SpecGroup>>;

enum Signal {
    Fs(notify::Result<Event>),
    Stop,
}

/// Owns the watcher thread. Dropping it stops the thread and waits for it.
pub struct WatchHandle {
    signals: Sender<Signal>,
    thread: Option<JoinHandle<()>>,
}

impl WatchHandle {
    /// Stop watching and wait for the thread to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.signals.send(Signal::Stop);
            if thread.join().is_err() {
                tracing::warn!("watch thread panicked");
            }
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Start watching the project at `root`.
///
/// Existing scan roots are watched recursively and the project root
/// non-recursively so top-level include matches are seen. The thread runs
/// until the returned handle is stopped or dropped, or until a send finds
/// `sender`'s receiver gone.
pub fn spawn(root: PathBuf, config: Config, sender: Sender<ScanUpdate>) -> Result<WatchHandle> {
    let (signal_tx, signal_rx) = mpsc::channel();
    let fs_tx = signal_tx.clone();
    let mut watcher: RecommendedWatcher = notify::recommended_watcher(move |res| {
        let _ = fs_tx.send(Signal::Fs(res));
    })?;

    for scan_root in config.scan_roots(&root) {
        if scan_root.is_dir() {
            watcher.watch(&scan_root, RecursiveMode::Recursive)?;
            tracing::debug!(path = %scan_root.display(), "watching scan root");
        }
    }
    watcher.watch(&root, RecursiveMode::NonRecursive)?;

    let debounce = Duration::from_millis(config.watch.debounce_ms);

    let thread = thread::spawn(move || {
        // Dropping the watcher stops event delivery.
        let _watcher = watcher;
        let mut pending: Option<Instant> = None;

        loop {
            let signal = match pending {
                Some(deadline) => {
                    match signal_rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                        Ok(signal) => Some(signal),
                        Err(mpsc::RecvTimeoutError::Timeout) => None,
                        Err(mpsc::RecvTimeoutError::Disconnected) => break,
                    }
                }
                None => match signal_rx.recv() {
                    Ok(signal) => Some(signal),
                    Err(_) => break,
                },
            };

            match signal {
                Some(Signal::Stop) => break,
                Some(Signal::Fs(Ok(event))) => {
                    if touches_markdown(&event) {
                        pending = Some(Instant::now() + debounce);
                    }
                }
                Some(Signal::Fs(Err(err))) => {
                    tracing::warn!(error = %err, "watch error");
                    if sender.send(Err(Error::Watch(err))).is_err() {
                        break;
                    }
                }
                None => {
                    pending = None;
                    tracing::debug!(root = %root.display(), "change settled, rescanning");
                    if sender.send(scan(&root, &config)).is_err() {
                        break;
                    }
                }
            }
        }
        tracing::debug!(root = %root.display(), "watcher stopped");
    });

    Ok(WatchHandle {
        signals: signal_tx,
        thread: Some(thread),
    })
}

fn touches_markdown(event: &Event) -> bool {
    event.paths.iter().any(|path| is_markdown(path))
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}
