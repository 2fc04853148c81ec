//! Error types for the catalog synchronizer.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the catalog synchronizer.
#[derive(Error, Debug)]
pub enum Error {
    // Startup errors
    #[error("TMDB bearer token not configured. Set TMDB_BEARER_TOKEN environment variable")]
    TmdbTokenMissing,

    #[error("TMDB bearer token rejected")]
    TmdbTokenInvalid,

    #[error("Invalid configuration: {0}")]
    Config(String),

    // Remote service errors
    #[error("Error fetching {endpoint}: {status} {reason}")]
    RemoteService {
        status: u16,
        endpoint: String,
        reason: String,
    },

    // Store errors
    #[error("{entity} already exists: {key}")]
    Conflict { entity: &'static str, key: String },

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Invalid store file: {0}")]
    InvalidStoreFile(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    // Run control
    #[error("Sync cancelled")]
    Cancelled,

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Whether the error came from talking to the remote catalog.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::TmdbTokenInvalid
                | Error::RemoteService { .. }
                | Error::Http(_)
                | Error::Json(_)
        )
    }

    /// Whether the error is a uniqueness violation in the store.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }
}

/// Failure while ingesting a single movie.
///
/// Carries the movie's identity so the run summary and logs can name it.
#[derive(Error, Debug)]
#[error("movie {remote_id} ({title}): {source}")]
pub struct IngestError {
    pub remote_id: u64,
    pub title: String,
    #[source]
    pub source: Error,
}
