//! Error types for schedule retrieval.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Why a single download attempt failed.
///
/// Every variant is retryable: the cascade moves on to the next candidate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("received an HTML page instead of JSON")]
    Markup,

    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(String),
}

/// A refresh-level failure, returned once the whole source has been tried.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The configured URL could not be turned into a download location.
    #[error("cannot resolve source {url}: {reason}")]
    SourceResolution { url: String, reason: String },

    /// Every candidate failed at the transport level.
    #[error("download failed after {attempts} attempt(s), last tried {url}: {last}")]
    Transport {
        attempts: usize,
        url: String,
        last: AttemptError,
    },

    /// Bytes were retrieved but are not a schedule document.
    #[error("invalid schedule document: {0}")]
    Schema(String),

    #[error("local file {} not found, export the schedule first", .0.display())]
    LocalNotFound(PathBuf),
}

/// A relay entry that cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("invalid relay URL {base}: {reason}")]
    InvalidUrl { base: String, reason: String },

    #[error("relay {0} has no query parameter")]
    MissingParam(String),
}

impl FetchError {
    /// Short machine-friendly name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::SourceResolution { .. } => "source",
            FetchError::Transport { .. } => "transport",
            FetchError::Schema(_) => "schema",
            FetchError::LocalNotFound(_) => "local-not-found",
        }
    }
}
