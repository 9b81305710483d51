//! Unified error types for layover.

use tokio_rusqlite::rusqlite;

/// Unified error type shared by the layover crates.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database operation failed.
    #[error("cache database error: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("cache migration failed: {0}")]
    MigrationFailed(String),

    /// A stored record could not be decoded for replay.
    #[error("corrupt cache record: {0}")]
    CorruptRecord(String),

    /// Invalid URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Cache generation name does not follow `<stem>-v<N>`.
    #[error("invalid cache generation name: {0}")]
    InvalidGeneration(String),

    /// Manifest file missing, unreadable, or malformed.
    #[error("invalid cache manifest: {0}")]
    InvalidManifest(String),

    /// Upstream request failed before any response was produced.
    #[error("upstream fetch failed: {0}")]
    Upstream(String),

    /// Upstream response body exceeded the configured size cap.
    #[error("upstream response too large: {0}")]
    TooLarge(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
