/// Viewer configuration, read from a JSON file.
///
/// Every field has a default, so an absent file or a partial one is fine.
use crate::render::DEFAULT_INDENT;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File name looked up when no explicit config path is given.
pub const CONFIG_FILE_NAME: &str = "pdmlview.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read { path: String, source: io::Error },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    /// Include the whole-packet `frame` layer in hex highlighting.
    pub hex_include_first: bool,

    /// Spaces per level in the rendered tree.
    pub indent_width: usize,

    /// Where expansion state is persisted between runs.
    pub expanded_paths_file: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            hex_include_first: false,
            indent_width: DEFAULT_INDENT,
            expanded_paths_file: None,
        }
    }
}

impl ViewerConfig {
    /// Load from `path`, falling back to defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
