/// Config file watcher: notifies when the viewer's config file changes.
///
/// A background thread polls the file's modification stamp and reports each
/// change on an unbuffered channel. Nothing in the tree model depends on
/// this; it exists for front-ends that want to reload settings live.
///
/// # Usage
///
/// ```ignore
/// let watcher = ConfigWatcher::new(PathBuf::from("pdmlview.json"))?;
/// while watcher.config_changed().recv().is_ok() {
///     // reload config
/// }
/// watcher.close()?;
/// ```
///
/// # Shutdown
///
/// [`ConfigWatcher::close`] consumes the watcher, so it can run only once and
/// cannot be reached from inside the polling thread. It blocks until the
/// thread has taken the close signal and exited. A notification nobody is
/// reading does not hold shutdown up: while the thread waits to deliver a
/// change it is also waiting on the close signal.
use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::io;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tracing::{debug, warn};

/// How often the file's metadata is checked.
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("cannot watch {path}: {source}")]
    Io { path: String, source: io::Error },

    #[error("failed to spawn config watcher thread: {0}")]
    Spawn(io::Error),

    #[error("config watcher thread panicked")]
    Panicked,
}

/// Modification time and length, or `None` while the file does not exist.
type Stamp = Option<(Option<SystemTime>, u64)>;

/// Handle to a running config watcher.
pub struct ConfigWatcher {
    change_rx: Receiver<()>,
    close_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl ConfigWatcher {
    /// Start watching `path`.
    ///
    /// The file need not exist yet; its creation counts as a change. Any
    /// other metadata error is returned.
    pub fn new(path: PathBuf) -> Result<Self, WatchError> {
        let initial = stamp(&path).map_err(|source| WatchError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let (change_tx, change_rx) = bounded::<()>(0);
        let (close_tx, close_rx) = bounded::<()>(0);

        let thread = thread::Builder::new()
            .name("pdmlview-config-watcher".to_owned())
            .spawn(move || run_watcher(path, initial, change_tx, close_rx))
            .map_err(WatchError::Spawn)?;

        Ok(Self {
            change_rx,
            close_tx: Some(close_tx),
            thread: Some(thread),
        })
    }

    /// Receives one message per observed change.
    pub fn config_changed(&self) -> &Receiver<()> {
        &self.change_rx
    }

    /// Stop the background thread and wait for it to exit.
    pub fn close(mut self) -> Result<(), WatchError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), WatchError> {
        if let Some(close_tx) = self.close_tx.take() {
            // Rendezvous: returns once the thread has taken the signal, or
            // immediately if the thread is already gone.
            let _ = close_tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            thread.join().map_err(|_| WatchError::Panicked)?;
        }
        Ok(())
    }
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("Config watcher: {e}");
        }
    }
}

// ─── Background thread ──────────────────────────────────────────────────────

fn run_watcher(path: PathBuf, mut last: Stamp, change_tx: Sender<()>, close_rx: Receiver<()>) {
    debug!("Config watcher: starting on {}", path.display());

    loop {
        let closed = select! {
            recv(close_rx) -> _ => true,
            default(POLL_INTERVAL) => false,
        };
        if closed {
            break;
        }

        let current = match stamp(&path) {
            Ok(current) => current,
            Err(e) => {
                debug!("Error from config watcher: {e}");
                continue;
            }
        };
        if current == last {
            continue;
        }
        last = current;

        // Block until someone takes the notification, but stay closable.
        let stop = select! {
            send(change_tx, ()) -> res => res.is_err(),
            recv(close_rx) -> _ => true,
        };
        if stop {
            break;
        }
    }

    debug!("Config watcher: stopped for {}", path.display());
}

fn stamp(path: &Path) -> io::Result<Stamp> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(Some((meta.modified().ok(), meta.len()))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
