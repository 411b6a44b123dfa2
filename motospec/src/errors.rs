//! Error types for motospec.
//!
//! Every error that flows through the shared error channel is a
//! [`ScrapeError`]. Its [`ErrorKind`] discriminant is fixed by the layer that
//! raised it (fetch client or stage) and is what the error sink routes on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Classification used by the error sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The fetch collaborator gave up waiting for a response.
    Timeout,
    /// Connection-level failure (DNS, refused, reset).
    Network,
    /// Any other transport failure (bad status, unreadable body, client gone).
    Other,
    /// Raised by a stage: bad item shape, missing node or attribute.
    Processing,
}

impl ErrorKind {
    /// All kinds, in routing-table order.
    pub const ALL: [Self; 4] = [Self::Timeout, Self::Network, Self::Other, Self::Processing];

    /// Whether this kind originates from the fetch layer.
    #[must_use]
    pub fn is_transport(self) -> bool {
        !matches!(self, Self::Processing)
    }

    /// Stable lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::Other => "other",
            Self::Processing => "processing",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error reported on the pipeline's shared error channel.
///
/// None of these are fatal to a worker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScrapeError {
    /// The request did not complete in time.
    #[error("request to {url} timed out after {attempts} attempt(s)")]
    Timeout {
        /// Requested URL.
        url: String,
        /// Attempts made before giving up.
        attempts: usize,
    },

    /// Connection-level failure.
    #[error("network failure fetching {url}: {message}")]
    Network {
        /// Requested URL.
        url: String,
        /// Underlying cause.
        message: String,
    },

    /// Other transport failure.
    #[error("fetch of {url} failed: {message}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Underlying cause.
        message: String,
        /// HTTP status, when the server answered.
        status: Option<u16>,
    },

    /// A stage could not turn its input into output.
    #[error("{stage}: {message}")]
    Processing {
        /// Name of the stage that raised it.
        stage: String,
        /// What went wrong.
        message: String,
    },

    /// A selector expression failed to parse.
    #[error("invalid selector `{selector}`: {message}")]
    Selector {
        /// The offending expression.
        selector: String,
        /// Parser message.
        message: String,
    },
}

impl ScrapeError {
    /// Creates a timeout error for a single attempt.
    #[must_use]
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout {
            url: url.into(),
            attempts: 1,
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a transport error without a status.
    #[must_use]
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Creates a transport error for a non-success HTTP status.
    #[must_use]
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Transport {
            url: url.into(),
            message: format!("unexpected status {status}"),
            status: Some(status),
        }
    }

    /// Creates a processing error attributed to `stage`.
    #[must_use]
    pub fn processing(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Processing {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Creates a selector parse error.
    #[must_use]
    pub fn selector(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.into(),
        }
    }

    /// The routing discriminant.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Network { .. } => ErrorKind::Network,
            Self::Transport { .. } => ErrorKind::Other,
            Self::Processing { .. } | Self::Selector { .. } => ErrorKind::Processing,
        }
    }

    /// HTTP status carried by a transport error.
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Records how many attempts were made, for timeouts.
    #[must_use]
    pub fn with_attempts(self, attempts: usize) -> Self {
        match self {
            Self::Timeout { url, .. } => Self::Timeout { url, attempts },
            other => other,
        }
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for the schema.
    #[error("cannot parse config {}: {source}", path.display())]
    Parse {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A value is out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised while persisting results.
#[derive(Debug, Error)]
pub enum OutputError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
