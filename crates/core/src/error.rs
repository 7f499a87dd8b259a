//! Unified error types for navhub.
//!
//! Variants fall into three groups: bad input (surfaced to callers as 400s),
//! transient fetch failures (always recovered by the favicon resolver), and
//! persistence failures.

use tokio_rusqlite::rusqlite;

/// Unified error types for the navhub service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., missing url).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// No directory entry for the given id.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// A unique key (link url) is already taken.
    #[error("CONFLICT: {0}")]
    Conflict(String),

    /// No authenticated identity on the request.
    #[error("UNAUTHORIZED")]
    Unauthorized,

    /// Authenticated identity lacks the admin role.
    #[error("FORBIDDEN: {0}")]
    Forbidden(String),

    /// Database operation failed.
    #[error("STORE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A store call did not finish within its deadline.
    #[error("STORE_TIMEOUT: {0}")]
    StoreTimeout(String),

    /// SSRF blocked - private/internal address not allowed.
    #[error("SSRF_BLOCKED: {0}")]
    SsrfBlocked(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Network failure or unusable HTTP response.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),
}

impl Error {
    /// True for the failures the resolver treats as "this strategy yielded nothing".
    pub fn is_transient_fetch(&self) -> bool {
        matches!(
            self,
            Error::SsrfBlocked(_) | Error::FetchTimeout(_) | Error::FetchTooLarge(_) | Error::HttpError(_)
        )
    }

    /// True for bad caller input.
    pub fn is_bad_request(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::InvalidUrl(_))
    }
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
