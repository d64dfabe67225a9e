//! Error types for Tapedeck

use std::io;
use thiserror::Error;

/// Result type for Tapedeck operations
pub type Result<T> = std::result::Result<T, TapedeckError>;

/// Errors that can occur in Tapedeck
#[derive(Debug, Error)]
pub enum TapedeckError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Playback request has no recorded entry left for its correlation key
    #[error("No recorded entry for key '{0}': playback diverged from the recorded session")]
    NoMatchingRecord(String),

    /// Playback asset-name lookup is exhausted or the test name is unknown
    #[error("No recorded name for test '{0}': playback diverged from the recorded session")]
    NoRecordedName(String),

    /// Session file or directory unreadable, malformed, or unwritable
    #[error("Persistence failure at {path}: {reason}")]
    Persistence {
        /// Path of the offending file or directory
        path: String,
        /// What went wrong
        reason: String,
    },

    /// Operation invoked before the session was started
    #[error("Mock server used before start")]
    Uninitialized,

    /// Live transport failure while forwarding a request
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Test identity unsafe to use as a directory name
    #[error("Invalid test identity: {0}")]
    InvalidIdentity(String),
}

impl TapedeckError {
    /// Build a persistence error for `path`
    pub fn persistence(path: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        Self::Persistence {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}
