//! Error types for the scaffold API client.
//!
//! # Design
//! Configuration mistakes (`UnsupportedFormat`, `InvalidConfig`) are
//! programmer errors and always reach the caller. Everything that can go
//! wrong on the wire (`RequestFailed`, `Transport`, `Timeout`) or while
//! encoding a request body (`Serialization`) is subject to the client's
//! rescue policy. A body that fails to decode is not an error at all; it is
//! returned as raw text.

use std::time::Duration;

use thiserror::Error;

/// Errors produced by `ScaffoldClient` and its transport.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The requested wire format is neither JSON nor XML.
    #[error("unsupported request format: {0} (expected json or xml)")]
    UnsupportedFormat(String),

    /// The configuration is unusable, e.g. an empty hostname.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The server answered with a non-2xx status. Displays the status
    /// message only, which is what callers log.
    #[error("{message}")]
    RequestFailed {
        status: u16,
        message: String,
        body: String,
    },

    /// The transport could not complete the round-trip (connection refused,
    /// TLS failure, I/O error).
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The transport gave up waiting for the server.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The request payload could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ClientError {
    /// True for errors that indicate a programming mistake and must never be
    /// swallowed by the rescue policy.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ClientError::UnsupportedFormat(_) | ClientError::InvalidConfig(_)
        )
    }

    /// HTTP status carried by a `RequestFailed` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
