//! JSON and protobuf codecs.
//!
//! Binary-capable types opt in through [`WireMessage`]. Everything else is
//! JSON-only. The object-safe [`EncodeJson`] and [`EncodeMessage`] traits let
//! the server and client carry a borrowed value of either kind in a single
//! sum type without generics.

use prost::Message;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::PrettyFormatter;

use crate::error::{DecodeError, EncodeError, RequiredFieldError};
use crate::negotiation::Representation;

/// A message that can travel as either JSON or serialized protobuf.
///
/// Implement it with an empty body for plain proto3 messages. Messages with
/// proto2 `required` fields override [`check_required`](Self::check_required)
/// so that a JSON document omitting such a field is rejected the same way a
/// truncated binary body would be.
///
/// ```ignore
/// impl WireMessage for User {
///     fn check_required(&self) -> Result<(), RequiredFieldError> {
///         if self.email.is_none() {
///             return Err(RequiredFieldError::new("User", "email"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait WireMessage: Message + Serialize + DeserializeOwned + Default {
    /// Verify that every required field is set.
    fn check_required(&self) -> Result<(), RequiredFieldError> {
        Ok(())
    }
}

/// Pretty-printing configuration for JSON output.
///
/// Both fields empty means compact output. Otherwise every element starts on
/// a new line that begins with `prefix` followed by one `indent` per level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonStyle {
    prefix: String,
    indent: String,
}

impl JsonStyle {
    pub fn compact() -> Self {
        Self::default()
    }

    pub fn indented<P: Into<String>, I: Into<String>>(prefix: P, indent: I) -> Self {
        Self {
            prefix: prefix.into(),
            indent: indent.into(),
        }
    }

    pub fn is_compact(&self) -> bool {
        self.prefix.is_empty() && self.indent.is_empty()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn indent(&self) -> &str {
        &self.indent
    }
}

/// Serialize `value` as JSON using `style`.
pub fn encode_json<T>(value: &T, style: &JsonStyle) -> Result<Vec<u8>, EncodeError>
where
    T: Serialize + ?Sized,
{
    if style.is_compact() {
        return Ok(serde_json::to_vec(value)?);
    }

    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(style.indent.as_bytes());
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;

    if style.prefix.is_empty() {
        return Ok(out);
    }

    // Raw newlines only separate elements; newlines inside strings are escaped.
    let mut prefixed = Vec::with_capacity(out.len() + style.prefix.len() * 8);
    for byte in out {
        prefixed.push(byte);
        if byte == b'\n' {
            prefixed.extend_from_slice(style.prefix.as_bytes());
        }
    }
    Ok(prefixed)
}

/// Deserialize a JSON-only value.
pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DecodeError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Serialize a message in the given representation.
///
/// The binary path refuses incomplete messages.
pub fn encode_message<M: WireMessage>(
    msg: &M,
    repr: Representation,
    style: &JsonStyle,
) -> Result<Vec<u8>, EncodeError> {
    match repr {
        Representation::Binary => {
            msg.check_required()?;
            Ok(msg.encode_to_vec())
        }
        Representation::Json => encode_json(msg, style),
    }
}

/// Deserialize a message from the given representation.
///
/// Both paths finish with a required-field pass; JSON deserialization alone
/// does not know which fields the schema requires.
pub fn decode_message<M: WireMessage>(
    bytes: &[u8],
    repr: Representation,
) -> Result<M, DecodeError> {
    let msg = match repr {
        Representation::Binary => M::decode(bytes)?,
        Representation::Json => serde_json::from_slice::<M>(bytes)?,
    };
    msg.check_required()?;
    Ok(msg)
}

/// Object-safe JSON encoding, implemented for every `Serialize` type.
pub trait EncodeJson: Sync {
    fn to_json(&self, style: &JsonStyle) -> Result<Vec<u8>, EncodeError>;
}

impl<T> EncodeJson for T
where
    T: Serialize + Sync + ?Sized,
{
    fn to_json(&self, style: &JsonStyle) -> Result<Vec<u8>, EncodeError> {
        encode_json(self, style)
    }
}

/// Object-safe encoding of a binary-capable message, implemented for every
/// [`WireMessage`].
pub trait EncodeMessage: EncodeJson {
    fn to_binary(&self) -> Result<Vec<u8>, EncodeError>;

    fn to_representation(
        &self,
        repr: Representation,
        style: &JsonStyle,
    ) -> Result<Vec<u8>, EncodeError> {
        match repr {
            Representation::Binary => self.to_binary(),
            Representation::Json => self.to_json(style),
        }
    }
}

impl<M: WireMessage> EncodeMessage for M {
    fn to_binary(&self) -> Result<Vec<u8>, EncodeError> {
        encode_message(self, Representation::Binary, &JsonStyle::compact())
    }
}
