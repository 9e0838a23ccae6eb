//! Request bodies.

use std::fmt;

use bytes::Bytes;
use restwire_core::{
    EncodeJson, EncodeMessage, JSON_CONTENT_TYPE, JsonStyle, PROTOBUF_CONTENT_TYPES, WireMessage,
};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::ClientError;

/// What a call sends, chosen where the call is made.
///
/// Raw bytes and readers go out untouched with no `Content-Type`. Pre-encoded
/// JSON and JSON-only values are sent as `application/json`. Binary-capable
/// messages follow the client's protobuf setting.
pub enum RequestBody<'a> {
    /// No body.
    Empty,
    /// Raw bytes.
    Bytes(Bytes),
    /// A stream read to completion before the request is sent.
    Reader(Box<dyn AsyncRead + Send + Unpin + 'a>),
    /// A pre-encoded JSON document.
    RawJson(Bytes),
    /// JSON-only value.
    Json(&'a dyn EncodeJson),
    /// Binary-capable message.
    Message(&'a dyn EncodeMessage),
}

impl<'a> RequestBody<'a> {
    pub fn json<T: Serialize + Sync>(value: &'a T) -> Self {
        RequestBody::Json(value)
    }

    pub fn message<M: WireMessage>(msg: &'a M) -> Self {
        RequestBody::Message(msg)
    }

    pub fn raw_json<B: Into<Bytes>>(json: B) -> Self {
        RequestBody::RawJson(json.into())
    }

    pub fn reader<R: AsyncRead + Send + Unpin + 'a>(reader: R) -> Self {
        RequestBody::Reader(Box::new(reader))
    }

    /// Serialize into the bytes that go on the wire.
    pub(crate) async fn into_payload(self, protobuf: bool) -> Result<Payload, ClientError> {
        let payload = match self {
            RequestBody::Empty => Payload::raw(Bytes::new()),
            RequestBody::Bytes(bytes) => Payload::raw(bytes),
            RequestBody::Reader(mut reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf).await.map_err(|err| {
                    tracing::error!("Failed to read request body: {err}");
                    ClientError::Body(err.to_string())
                })?;
                Payload::raw(buf.into())
            }
            RequestBody::RawJson(json) => Payload::typed(json, JSON_CONTENT_TYPE),
            RequestBody::Json(value) => {
                Payload::typed(encode(value.to_json(&JsonStyle::compact()))?, JSON_CONTENT_TYPE)
            }
            RequestBody::Message(msg) if protobuf => {
                Payload::typed(encode(msg.to_binary())?, PROTOBUF_CONTENT_TYPES[0])
            }
            RequestBody::Message(msg) => {
                Payload::typed(encode(msg.to_json(&JsonStyle::compact()))?, JSON_CONTENT_TYPE)
            }
        };
        Ok(payload)
    }
}

fn encode(result: Result<Vec<u8>, restwire_core::EncodeError>) -> Result<Bytes, ClientError> {
    result.map(Bytes::from).map_err(|err| {
        tracing::error!("Failed to marshal: {err}");
        ClientError::Encode(err)
    })
}

impl fmt::Debug for RequestBody<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Empty => f.write_str("Empty"),
            RequestBody::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            RequestBody::Reader(_) => f.write_str("Reader(..)"),
            RequestBody::RawJson(json) => write!(f, "RawJson({} bytes)", json.len()),
            RequestBody::Json(_) => f.write_str("Json(..)"),
            RequestBody::Message(_) => f.write_str("Message(..)"),
        }
    }
}

impl From<()> for RequestBody<'_> {
    fn from(_: ()) -> Self {
        RequestBody::Empty
    }
}

impl From<Bytes> for RequestBody<'_> {
    fn from(bytes: Bytes) -> Self {
        RequestBody::Bytes(bytes)
    }
}

impl From<Vec<u8>> for RequestBody<'_> {
    fn from(bytes: Vec<u8>) -> Self {
        RequestBody::Bytes(bytes.into())
    }
}

impl<'a> From<&'a [u8]> for RequestBody<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        RequestBody::Bytes(Bytes::copy_from_slice(bytes))
    }
}

/// A serialized body and the content type it declares, if any.
#[derive(Debug, Clone)]
pub(crate) struct Payload {
    pub(crate) bytes: Bytes,
    pub(crate) content_type: Option<&'static str>,
}

impl Payload {
    fn raw(bytes: Bytes) -> Self {
        Self {
            bytes,
            content_type: None,
        }
    }

    fn typed(bytes: Bytes, content_type: &'static str) -> Self {
        Self {
            bytes,
            content_type: Some(content_type),
        }
    }
}
