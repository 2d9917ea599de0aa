//! Unified error types for chatblock.
//!
//! The segmentation core never fails on malformed input: every anomaly is
//! represented as data (see [`crate::alert`]). Errors only arise at the
//! boundaries, when reading a transcript from disk or when a caller supplies
//! an unusable configuration.

use std::io;

use thiserror::Error;

/// A specialized [`Result`] type for chatblock operations.
pub type Result<T> = std::result::Result<T, ChatblockError>;

/// The error type for all chatblock operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChatblockError {
    /// An I/O error occurred.
    ///
    /// This typically happens when the transcript file doesn't exist, isn't
    /// readable, or isn't valid UTF-8.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A configuration value is unusable.
    ///
    /// For example a placement config whose isolation folder name is empty.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong.
        message: String,
    },
}

impl ChatblockError {
    /// Convenience constructor for [`ChatblockError::InvalidConfig`].
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
