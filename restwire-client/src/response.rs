//! Buffered responses.

use std::borrow::Cow;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};
use restwire_core::{DecodeError, Representation, WireMessage, decode_json, decode_message, is_json};
use serde::de::DeserializeOwned;

use crate::error::ClientError;

/// A fully buffered response.
///
/// The body can be decoded any number of times. Binary-capable values are
/// decoded in the representation the client was configured with, whatever
/// the response's own `Content-Type` says.
#[derive(Debug, Clone)]
pub struct Response {
    inner: http::Response<Bytes>,
    binary: bool,
}

impl Response {
    pub(crate) fn new(inner: http::Response<Bytes>, binary: bool) -> Self {
        Self { inner, binary }
    }

    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    pub fn body(&self) -> &Bytes {
        self.inner.body()
    }

    /// Body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.inner.body())
    }

    /// Whether binary-capable values are decoded as protobuf.
    pub fn is_binary(&self) -> bool {
        self.binary
    }

    pub fn into_inner(self) -> http::Response<Bytes> {
        self.inner
    }

    /// Decode a binary-capable message.
    pub fn decode<T: WireMessage>(&self) -> Result<T, ClientError> {
        let repr = Representation::from_flag(self.binary);
        let result = decode_message(self.body(), repr);
        self.explain(result, repr)
    }

    /// Decode a JSON-only value.
    pub fn decode_json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        self.explain(decode_json(self.body()), Representation::Json)
    }

    fn declares_json(&self) -> bool {
        self.headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(is_json)
    }

    // A failed JSON decode of a non-JSON response is most likely an error
    // page, so surface its text instead of the parser message.
    fn explain<T>(
        &self,
        result: Result<T, DecodeError>,
        repr: Representation,
    ) -> Result<T, ClientError> {
        result.map_err(|err| {
            if !repr.is_binary() && !self.declares_json() {
                tracing::error!("Failed to decode response: {err}");
                ClientError::UnexpectedBody(self.text().into_owned())
            } else {
                ClientError::Decode(err)
            }
        })
    }
}
