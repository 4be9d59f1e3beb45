/// Persistent expand/collapse state, addressed by name path.
///
/// A path is the chain of canonical names from the root to a node, e.g.
/// `["", "tcp", "tcp.flags"]`. The store is a plain ordered list compared by
/// sequence equality; paths are short and few, so a linear scan beats
/// hashing here and keeps insertion order stable for serialisation.
///
/// One store lives for a whole session and is shared with every tree
/// decoded during it, so expansion choices survive switching packets.
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// A store shared between the session and each decoded tree.
///
/// Every read-then-write sequence (insert-if-absent, prefix insertion on
/// expand) must happen under a single lock acquisition.
pub type SharedExpandedPaths = Arc<Mutex<ExpandedPaths>>;

/// Errors from loading or saving a persisted store.
#[derive(Debug, Error)]
pub enum PathsError {
    #[error("failed to read expansion state from {path}: {source}")]
    Read { path: String, source: io::Error },

    #[error("failed to write expansion state to {path}: {source}")]
    Write { path: String, source: io::Error },

    #[error("invalid expansion state in {path}: {source}")]
    Format {
        path: String,
        source: serde_json::Error,
    },
}

/// Ordered set of expansion paths with set semantics enforced on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpandedPaths {
    paths: Vec<Vec<String>>,
}

impl ExpandedPaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a fresh store for sharing across decodes.
    pub fn shared(self) -> SharedExpandedPaths {
        Arc::new(Mutex::new(self))
    }

    /// Insert `path` unless an equal path is already stored.
    ///
    /// Returns `false` (and changes nothing) if the path was already present.
    pub fn add_expanded<S: AsRef<str>>(&mut self, path: &[S]) -> bool {
        if self.contains(path) {
            return false;
        }
        self.paths
            .push(path.iter().map(|s| s.as_ref().to_owned()).collect());
        true
    }

    /// Remove the entry equal to `path`.
    ///
    /// Returns `false` if no such entry was stored. Prefixes and extensions
    /// of `path` are left alone.
    pub fn remove_expanded<S: AsRef<str>>(&mut self, path: &[S]) -> bool {
        match self.position(path) {
            Some(i) => {
                self.paths.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn contains<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.position(path).is_some()
    }

    fn position<S: AsRef<str>>(&self, path: &[S]) -> Option<usize> {
        self.paths.iter().position(|stored| {
            stored.len() == path.len()
                && stored.iter().zip(path).all(|(a, b)| a == b.as_ref())
        })
    }

    /// Stored paths in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &[String]> {
        self.paths.iter().map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    /// Load a store previously written by [`save`](Self::save).
    ///
    /// A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, PathsError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No expansion state at {}, starting empty", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(PathsError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        let store: Self = serde_json::from_str(&text).map_err(|source| PathsError::Format {
            path: path.display().to_string(),
            source,
        })?;
        debug!(
            "Loaded {} expansion paths from {}",
            store.len(),
            path.display()
        );
        Ok(store)
    }

    /// Write the store as a JSON array of string arrays.
    pub fn save(&self, path: &Path) -> Result<(), PathsError> {
        let text = serde_json::to_string_pretty(self).map_err(|source| PathsError::Format {
            path: path.display().to_string(),
            source,
        })?;
        std::fs::write(path, text).map_err(|source| PathsError::Write {
            path: path.display().to_string(),
            source,
        })
    }
}

impl<S: AsRef<str>> FromIterator<Vec<S>> for ExpandedPaths {
    fn from_iter<I: IntoIterator<Item = Vec<S>>>(iter: I) -> Self {
        let mut store = Self::new();
        for path in iter {
            store.add_expanded(&path);
        }
        store
    }
}
