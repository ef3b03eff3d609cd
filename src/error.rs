//! Error types shared by every tormgr component.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the configuration, service and schedule layers.
#[derive(Debug, Error)]
pub enum TorError {
    /// The managed binary is not on PATH; the requested operation was not attempted.
    #[error("Tor is not installed. Install it first.")]
    NotInstalled,

    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported interval: {0} minutes (expected one of 1, 30, 60, 240, 720, 1440)")]
    UnsupportedInterval(u32),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An external command exited unsuccessfully or could not be spawned.
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl TorError {
    /// Wrap an IO error, mapping `NotFound` to the dedicated variant.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            TorError::NotFound(path)
        } else {
            TorError::Io { path, source }
        }
    }
}

impl From<reqwest::Error> for TorError {
    fn from(e: reqwest::Error) -> Self {
        TorError::Network(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TorError>;
