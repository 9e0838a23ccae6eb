//! Reply values accepted by [`Session::status`](crate::Session::status).

use std::borrow::Cow;

use restwire_core::{EncodeJson, EncodeMessage, WireMessage};
use serde::Serialize;

/// What a handler writes after the status line.
///
/// The variant is chosen once, where the handler builds the reply:
/// a [`WireMessage`] may be negotiated into protobuf, any other serializable
/// value is always JSON, and text bypasses structured encoding.
pub enum Reply<'a> {
    /// Status line only.
    Empty,
    /// `text/plain` body followed by a newline.
    Text(Cow<'a, str>),
    /// JSON-only value.
    Json(&'a dyn EncodeJson),
    /// Binary-capable message, encoded per content negotiation.
    Message(&'a dyn EncodeMessage),
}

impl<'a> Reply<'a> {
    pub fn text<S: Into<Cow<'a, str>>>(text: S) -> Self {
        Reply::Text(text.into())
    }

    pub fn json<T: Serialize + Sync>(value: &'a T) -> Self {
        Reply::Json(value)
    }

    pub fn message<M: WireMessage>(msg: &'a M) -> Self {
        Reply::Message(msg)
    }

    /// Reply with the error's message as plain text.
    pub fn error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        Reply::Text(Cow::Owned(err.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Reply::Empty)
    }
}

impl std::fmt::Debug for Reply<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reply::Empty => f.write_str("Empty"),
            Reply::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Reply::Json(_) => f.write_str("Json(..)"),
            Reply::Message(_) => f.write_str("Message(..)"),
        }
    }
}

impl From<()> for Reply<'_> {
    fn from(_: ()) -> Self {
        Reply::Empty
    }
}

impl<'a> From<&'a str> for Reply<'a> {
    fn from(text: &'a str) -> Self {
        Reply::Text(Cow::Borrowed(text))
    }
}

impl From<String> for Reply<'_> {
    fn from(text: String) -> Self {
        Reply::Text(Cow::Owned(text))
    }
}

impl<'a, T> From<Option<T>> for Reply<'a>
where
    T: Into<Reply<'a>>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Reply::Empty, Into::into)
    }
}
