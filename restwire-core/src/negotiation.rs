//! Content negotiation between JSON and the binary protobuf representation.
//!
//! Media types are matched by case-sensitive prefix, so parameterized values
//! such as `application/json; charset=utf-8` or `application/protobuf; foo=bar`
//! are recognized without a full media-type parser.

use http::HeaderMap;
use http::header::CONTENT_LENGTH;

pub use http::header::{ACCEPT, CONTENT_TYPE};

/// JSON media type.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Binary media types, in preference order. The first entry is used when a
/// request declared a binary body but did not name one in `Accept`.
pub const PROTOBUF_CONTENT_TYPES: [&str; 2] = ["application/protobuf", "application/x-protobuf"];

/// Media type of plain-text replies.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Value of `X-Content-Type-Options` on plain-text replies.
pub const NOSNIFF: &str = "nosniff";

/// The two wire representations of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Representation {
    /// `application/json`
    #[default]
    Json,
    /// Serialized protobuf (`application/protobuf`, `application/x-protobuf`)
    Binary,
}

impl Representation {
    /// Pick the representation from a static "use protobuf" flag.
    pub fn from_flag(binary: bool) -> Self {
        if binary { Self::Binary } else { Self::Json }
    }

    /// Default media type for this representation.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => JSON_CONTENT_TYPE,
            Self::Binary => PROTOBUF_CONTENT_TYPES[0],
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Binary => "protobuf",
        }
    }
}

/// Whether `mime` names one of the binary media types.
pub fn is_binary(mime: &str) -> bool {
    PROTOBUF_CONTENT_TYPES.iter().any(|t| mime.starts_with(t))
}

/// Whether `mime` names the JSON media type.
pub fn is_json(mime: &str) -> bool {
    mime.starts_with(JSON_CONTENT_TYPE)
}

/// Find the first media range, in header order, that starts with a binary
/// media type. Returns the recognized constant, not the raw range, so that
/// parameters on the range never leak into a response `Content-Type`.
pub fn accepted_binary<'a, I>(accept: I) -> Option<&'static str>
where
    I: IntoIterator<Item = &'a str>,
{
    accept
        .into_iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .find_map(|range| {
            PROTOBUF_CONTENT_TYPES
                .iter()
                .copied()
                .find(|t| range.starts_with(t))
        })
}

/// Negotiation inputs read from an inbound request.
///
/// Never mutates the request; holds copies of the header values it needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Negotiation {
    content_type: Option<String>,
    accept: Vec<String>,
    has_body: bool,
}

impl Negotiation {
    pub fn new(content_type: Option<String>, accept: Vec<String>, has_body: bool) -> Self {
        Self {
            content_type,
            accept,
            has_body,
        }
    }

    /// Read `Content-Type`, every `Accept` value and `Content-Length`.
    ///
    /// A missing, unparsable or zero `Content-Length` counts as "no body".
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let accept = headers
            .get_all(ACCEPT)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_owned)
            .collect();
        let has_body = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .is_some_and(|len| len > 0);
        Self::new(content_type, accept, has_body)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn has_body(&self) -> bool {
        self.has_body
    }

    fn declares_binary(&self) -> bool {
        self.content_type.as_deref().is_some_and(is_binary)
    }

    fn accept_match(&self) -> Option<&'static str> {
        accepted_binary(self.accept.iter().map(String::as_str))
    }

    /// Representation used to decode a binary-capable request body.
    ///
    /// Bodiless requests reuse the `Accept` hint as a decode hint.
    pub fn decode_representation(&self) -> Representation {
        if self.declares_binary() || (!self.has_body && self.accept_match().is_some()) {
            Representation::Binary
        } else {
            Representation::Json
        }
    }

    /// Representation and media type used to encode a binary-capable reply.
    pub fn encode_representation(&self) -> (Representation, &'static str) {
        match self.accept_match() {
            Some(accepted) => (Representation::Binary, accepted),
            None if self.declares_binary() => (Representation::Binary, PROTOBUF_CONTENT_TYPES[0]),
            None => (Representation::Json, JSON_CONTENT_TYPE),
        }
    }
}
