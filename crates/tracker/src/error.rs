//! Tracker error types.

use thiserror::Error;

/// Tracker errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A rating outside the supported scale.
    #[error("sleep quality must be between 0 and 5, got {0}")]
    InvalidQuality(i32),

    /// A session that is still being tracked cannot be rated.
    #[error("sleep session {0} is still being tracked; stop it before rating")]
    SessionOpen(storage::SessionId),

    /// A blocking store task panicked or was cancelled.
    #[error("store task failed: {0}")]
    Task(String),

    /// An error occurred in the storage layer.
    #[error(transparent)]
    Storage(#[from] storage::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
