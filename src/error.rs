//! Error taxonomy shared by the catalog transport and the aggregation pipeline.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while talking to the catalog or assembling a discography.
///
/// The first three variants classify a single remote call and decide whether
/// [`RetryExecutor`](crate::pipeline::RetryExecutor) tries again:
///
/// - [`Error::Transient`] - server errors (status >= 500) and connection
///   failures, retried with exponential backoff
/// - [`Error::RateLimited`] - the upstream asked us to slow down, retried
///   after the server-directed wait when one is given
/// - [`Error::NonRetryable`] - everything the upstream rejected for good
///   (400, 401, 403, 404, ...)
///
/// The remaining variants are terminal outcomes produced by the pipeline
/// itself or by the surrounding glue.
#[derive(Error, Debug)]
pub enum Error {
    #[error("transient failure{}: {message}", status_suffix(.status))]
    Transient {
        status: Option<u16>,
        message: String,
    },

    #[error("rate limited{}", retry_after_suffix(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    #[error("request rejected{}: {message}", status_suffix(.status))]
    NonRetryable {
        status: Option<u16>,
        message: String,
    },

    /// Every allowed attempt failed with a retryable error.
    #[error("gave up after {attempts} attempts: {last}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        last: Box<Error>,
    },

    /// One or more albums could not be fetched. Only produced when a caller
    /// refuses a partial result via [`Outcome::into_complete`](crate::pipeline::Outcome::into_complete).
    #[error("{} of {total} albums could not be fetched: {}", .failed_album_ids.len(), .failed_album_ids.join(", "))]
    PartialAggregation {
        failed_album_ids: Vec<String>,
        total: usize,
    },

    #[error("operation cancelled")]
    Cancelled,

    /// A worker task died before reporting a result.
    #[error("worker task failed: {0}")]
    Worker(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("missing or unusable credentials: {0}")]
    Credentials(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn transient(status: Option<u16>, message: impl Into<String>) -> Self {
        Error::Transient {
            status,
            message: message.into(),
        }
    }

    pub fn non_retryable(status: Option<u16>, message: impl Into<String>) -> Self {
        Error::NonRetryable {
            status,
            message: message.into(),
        }
    }

    /// Whether a failed attempt may be repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transient { .. } | Error::RateLimited { .. })
    }

    /// Classifies an HTTP status that is not a success.
    pub fn from_status(status: u16, retry_after: Option<Duration>, message: String) -> Self {
        match status {
            429 => Error::RateLimited { retry_after },
            500..=599 => Error::Transient {
                status: Some(status),
                message,
            },
            _ => Error::NonRetryable {
                status: Some(status),
                message,
            },
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Error::Decode(err.to_string());
        }

        if let Some(status) = err.status() {
            return Error::from_status(status.as_u16(), None, err.to_string());
        }

        if err.is_connect() || err.is_timeout() || err.is_request() {
            Error::transient(None, err.to_string())
        } else {
            Error::non_retryable(None, err.to_string())
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

fn retry_after_suffix(retry_after: &Option<Duration>) -> String {
    retry_after
        .map(|d| format!(", retry after {} ms", d.as_millis()))
        .unwrap_or_default()
}
