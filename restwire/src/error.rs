//! Session error types.

pub use restwire_core::{DecodeError, EncodeError, RequiredFieldError};

/// Errors raised by [`Session`](crate::Session) accessors.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Neither `X-Forwarded-For` nor the peer address held a parsable IP.
    #[error("invalid IP address: {0}")]
    InvalidIp(String),
}
