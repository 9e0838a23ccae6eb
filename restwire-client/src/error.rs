//! Client error types.
//!
//! This module provides [`ClientError`], the error type of every client call,
//! plus [`AuthError`] for [`Auth`](crate::Auth) implementations and
//! [`ClientBuildError`] for [`ClientBuilder`](crate::ClientBuilder).

use std::fmt;

use http::StatusCode;
use restwire_core::{DecodeError, EncodeError};

/// Error returned by an [`Auth`](crate::Auth) implementation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct AuthError(String);

impl AuthError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        AuthError(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// The [`Auth`](crate::Auth) operation that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthStage {
    Authorize,
    Validate,
    Invalidate,
}

impl fmt::Display for AuthStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuthStage::Authorize => "authorize",
            AuthStage::Validate => "validate auth",
            AuthStage::Invalidate => "invalidate auth",
        })
    }
}

/// Errors from building, sending or decoding a request.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level error (connection failed, timeout, etc.).
    #[error("transport error: {0}")]
    Transport(String),

    /// The request URL or a header could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A streamed request body could not be read.
    #[error("failed to read request body: {0}")]
    Body(String),

    /// Request body encoding error.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Response body decoding error.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A non-JSON response that failed to decode; carries the raw body text.
    #[error("{0}")]
    UnexpectedBody(String),

    /// The configured [`Auth`](crate::Auth) capability failed.
    #[error("failed to {stage}: {source}")]
    Auth {
        stage: AuthStage,
        #[source]
        source: AuthError,
    },

    /// The response status differs from the expected one.
    #[error("{actual}")]
    Status {
        expected: StatusCode,
        actual: StatusCode,
    },
}

impl ClientError {
    pub(crate) fn auth(stage: AuthStage, source: AuthError) -> Self {
        ClientError::Auth { stage, source }
    }

    /// The response status, for [`ClientError::Status`].
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { actual, .. } => Some(*actual),
            _ => None,
        }
    }
}

/// Error type for client building failures.
#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    /// The base URL does not parse.
    #[error("invalid base URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
