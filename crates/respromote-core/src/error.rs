//! Errors surfaced by a promotion.

use std::fmt;
use std::path::PathBuf;

use reqwest::Method;
use thiserror::Error;

/// Everything that can stop a promotion. No error is retried; whatever was
/// staged or deployed before the failure is left in place.
#[derive(Error, Debug)]
pub enum PromoteError {
    /// The server answered with a status outside 200/201/204.
    #[error("{method} {url} failed: {status}")]
    Status {
        /// Request method.
        method: Method,
        /// Full request URL.
        url: String,
        /// Status line, e.g. `404 Not Found`.
        status: String,
    },

    /// The request never produced a response, or its body could not be read.
    #[error("{method} {url} failed: {source}")]
    Request {
        /// Request method.
        method: Method,
        /// Full request URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The response was not the document we expected.
    #[error("Unexpected response from {url}: {message}")]
    Protocol {
        /// Resource the document came from.
        url: String,
        /// What was wrong with it.
        message: String,
    },

    /// Reading or writing the staging directory failed.
    #[error("Staging failed for {}: {source}", path.display())]
    Storage {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    Client(#[source] reqwest::Error),

    /// Endpoint or promotion settings are incomplete or invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl PromoteError {
    /// Create a protocol error for a document fetched from `url`.
    pub fn protocol(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Protocol {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a storage error for `path`.
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Whether this is a transport failure: a bad status or a failed request.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Status { .. } | Self::Request { .. })
    }
}
