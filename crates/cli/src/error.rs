//! CLI error types.

use crate::config::ConfigError;
use storage::SessionId;
use thiserror::Error;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// No session has the requested id.
    #[error("no sleep session with id {id}")]
    SessionNotFound { id: SessionId },

    /// A rating was requested but no night has been stopped yet.
    #[error("nothing to rate. Stop tracking a night first")]
    NothingToRate,

    /// Configuration is invalid or unreadable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error occurred in the tracker layer.
    #[error(transparent)]
    Tracker(#[from] tracker::Error),

    /// An error occurred in the storage layer.
    #[error(transparent)]
    Storage(#[from] storage::Error),

    /// Sessions could not be written as JSON.
    #[error("failed to serialize sessions: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
