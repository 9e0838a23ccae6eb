//! Codec error types shared by the server and the client.
//!
//! - [`DecodeError`]: malformed body or missing required field on the inbound path
//! - [`EncodeError`]: serialization failure on the outbound path
//! - [`RequiredFieldError`]: a message that decoded but is incomplete

/// A message is missing a field its schema marks as required.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("required field {message}.{field} not set")]
pub struct RequiredFieldError {
    message: String,
    field: String,
}

impl RequiredFieldError {
    pub fn new<M: Into<String>, F: Into<String>>(message: M, field: F) -> Self {
        Self {
            message: message.into(),
            field: field.into(),
        }
    }

    /// Name of the incomplete message type.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Name of the missing field.
    pub fn field(&self) -> &str {
        &self.field
    }
}

/// Failure to decode an inbound body.
///
/// The codec never picks an HTTP status for these; callers decide how to reply.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// JSON deserialization failed.
    #[error("failed to decode JSON body: {0}")]
    Json(String),

    /// Protobuf deserialization failed.
    #[error("failed to decode protobuf body: {0}")]
    Binary(String),

    /// The body decoded but the message is incomplete.
    #[error(transparent)]
    RequiredField(#[from] RequiredFieldError),

    /// The body could not be read at all.
    #[error("failed to read body: {0}")]
    Body(String),
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::Json(err.to_string())
    }
}

impl From<prost::DecodeError> for DecodeError {
    fn from(err: prost::DecodeError) -> Self {
        DecodeError::Binary(err.to_string())
    }
}

/// Failure to serialize an outbound value.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// JSON serialization failed.
    #[error("failed to encode JSON: {0}")]
    Json(String),

    /// The message cannot be serialized because it is incomplete.
    #[error(transparent)]
    RequiredField(#[from] RequiredFieldError),
}

impl From<serde_json::Error> for EncodeError {
    fn from(err: serde_json::Error) -> Self {
        EncodeError::Json(err.to_string())
    }
}
