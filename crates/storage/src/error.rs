use thiserror::Error;

/// Storage failures.
///
/// Every variant means the underlying medium could not complete the request.
/// A missing row is never an error; lookups return `None` instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("row decoding error: {0}")]
    Row(#[from] serde_rusqlite::Error),

    #[error("database connection lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, Error>;
