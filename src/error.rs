// src/error.rs
// =============================================================================
// Error types shared by every part of the mirror.
//
// Two families:
// - MirrorError: failures that end a job (workspace or archive I/O, bad root
//   URL, HTTP client construction). The job reports Failed.
// - FetchError: a single page or asset could not be downloaded. Callers
//   match on it and skip that one resource; it never ends a job by itself.
// =============================================================================

use std::path::PathBuf;
use thiserror::Error;

/// Fatal, job-ending failures.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// Creating a directory or writing a file failed.
    #[error("I/O failure at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The zip archive could not be created or a member could not be added.
    #[error("archive failure at {}: {source}", .path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("invalid root URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// A blocking task (archiving) panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl MirrorError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MirrorError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A page or asset that could not be retrieved.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to fetch {url}: {kind}")]
pub struct FetchError {
    pub url: String,
    pub kind: FetchErrorKind,
}

impl FetchError {
    pub fn new(url: impl Into<String>, kind: FetchErrorKind) -> Self {
        FetchError {
            url: url.into(),
            kind,
        }
    }
}

/// Why a fetch failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchErrorKind {
    #[error("request timed out")]
    Timeout,
    #[error("HTTP {0}")]
    Status(u16),
    #[error("connection failed")]
    Connect,
    #[error("too many redirects")]
    TooManyRedirects,
    #[error("not a fetchable URL")]
    InvalidUrl,
    #[error("{0}")]
    Other(String),
}
