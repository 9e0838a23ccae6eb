//! Per-request session facade.
//!
//! A [`Session`] is extracted once per request and dropped when the handler
//! returns. It decodes the request body and encodes the reply, choosing JSON
//! or protobuf from the request's `Content-Type` and `Accept` headers.
//!
//! ```rust,ignore
//! async fn user_handler(mut s: Session) -> Response {
//!     let id = s.var("id", "");
//!     match s.decode::<User>().await {
//!         Ok(user) => s.status(StatusCode::OK, Reply::message(&user)),
//!         Err(err) => s.status(StatusCode::BAD_REQUEST, Reply::error(&err)),
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::body::Body;
use axum::extract::{ConnectInfo, FromRequest, FromRequestParts, RawPathParams, Request};
use axum::http::header::{CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use axum::http::{Extensions, HeaderMap, HeaderValue, Method, StatusCode, Uri, request::Parts};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use restwire_core::{
    DecodeError, EncodeError, JSON_CONTENT_TYPE, NOSNIFF, Negotiation, TEXT_CONTENT_TYPE,
    WireMessage, decode_json, decode_message,
};
use serde::de::DeserializeOwned;
use url::form_urlencoded;

use crate::config::ServerConfig;
use crate::error::SessionError;
use crate::remote::remote_host;
use crate::reply::Reply;

/// Header carrying the originating client address when behind a proxy.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

// Set after the first missing-layer warning
static WARNED_MISSING_LAYER: AtomicBool = AtomicBool::new(false);

fn config_or_default(extensions: &Extensions) -> Arc<ServerConfig> {
    if let Some(config) = extensions.get::<Arc<ServerConfig>>() {
        return config.clone();
    }

    if !WARNED_MISSING_LAYER.swap(true, Ordering::Relaxed) {
        tracing::warn!(
            target: "restwire",
            "RestLayer not found. Using default server configuration."
        );
    }
    Arc::new(ServerConfig::default())
}

/// Request/response facade handed to handlers.
pub struct Session {
    parts: Parts,
    body: Option<Body>,
    vars: HashMap<String, String>,
    remote_addr: Option<String>,
    config: Arc<ServerConfig>,
    response_headers: HeaderMap,
    data: Extensions,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("method", &self.parts.method)
            .field("uri", &self.parts.uri)
            .field("vars", &self.vars)
            .field("remote_addr", &self.remote_addr)
            .field("body_consumed", &self.body.is_none())
            .finish_non_exhaustive()
    }
}

impl<S> FromRequest<S> for Session
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();

        // Handlers mounted outside a router have no path parameters.
        let vars = match RawPathParams::from_request_parts(&mut parts, state).await {
            Ok(params) => params
                .iter()
                .map(|(key, value)| (key.to_owned(), value.to_owned()))
                .collect(),
            Err(_) => HashMap::new(),
        };

        let remote_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string());
        let config = config_or_default(&parts.extensions);

        Ok(Session {
            parts,
            body: Some(body),
            vars,
            remote_addr,
            config,
            response_headers: HeaderMap::new(),
            data: Extensions::new(),
        })
    }
}

impl Session {
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    pub fn request_header(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Headers merged into whichever response [`status`](Self::status) builds.
    pub fn response_header(&mut self) -> &mut HeaderMap {
        &mut self.response_headers
    }

    /// Request-scoped values shared between handler layers.
    pub fn data(&self) -> &Extensions {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Extensions {
        &mut self.data
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Negotiation inputs of this request.
    pub fn negotiation(&self) -> Negotiation {
        Negotiation::from_headers(&self.parts.headers)
    }

    /// Decode a binary-capable message, as protobuf or JSON depending on the
    /// request headers.
    ///
    /// A JSON body is checked for required fields after decoding.
    pub async fn decode<T: WireMessage>(&mut self) -> Result<T, DecodeError> {
        let repr = self.negotiation().decode_representation();
        let bytes = self.read_body().await?;
        decode_message(&bytes, repr).inspect_err(|err| {
            tracing::error!(
                target: "restwire",
                "Failed to decode {} request body: {err}",
                repr.as_str()
            );
        })
    }

    /// Decode a JSON-only value.
    pub async fn decode_json<T: DeserializeOwned>(&mut self) -> Result<T, DecodeError> {
        let bytes = self.read_body().await?;
        decode_json(&bytes).inspect_err(|err| {
            tracing::error!(target: "restwire", "Failed to decode JSON request body: {err}");
        })
    }

    async fn read_body(&mut self) -> Result<Bytes, DecodeError> {
        let body = self
            .body
            .take()
            .ok_or_else(|| DecodeError::Body("request body already consumed".to_string()))?;
        let limit = self.config.get_body_limit().unwrap_or(usize::MAX);
        axum::body::to_bytes(body, limit).await.map_err(|err| {
            tracing::error!(target: "restwire", "Failed to read request body: {err}");
            DecodeError::Body(err.to_string())
        })
    }

    /// Build the response for `code` and `reply`.
    ///
    /// Encoding failures are logged and turn into a bare `500` with no body;
    /// no other representation is attempted.
    pub fn status<'a>(&mut self, code: StatusCode, reply: impl Into<Reply<'a>>) -> Response {
        match self.try_status(code, reply) {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(target: "restwire", "Failed to encode body: {err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }

    /// Like [`status`](Self::status), but hands encoding failures back.
    pub fn try_status<'a>(
        &mut self,
        code: StatusCode,
        reply: impl Into<Reply<'a>>,
    ) -> Result<Response, EncodeError> {
        match reply.into() {
            Reply::Empty => Ok(self.respond(code, None, Body::empty())),
            Reply::Text(text) => Ok(self.text(code, &text)),
            Reply::Json(value) => {
                let body = value.to_json(self.config.json_style())?;
                tracing::debug!(target: "restwire", "Writing JSON: {} bytes", body.len());
                Ok(self.respond(code, Some(JSON_CONTENT_TYPE), Body::from(body)))
            }
            Reply::Message(msg) => {
                let (repr, content_type) = self.negotiation().encode_representation();
                let body = msg.to_representation(repr, self.config.json_style())?;
                tracing::debug!(
                    target: "restwire",
                    "Writing {}: {} bytes",
                    repr.as_str(),
                    body.len()
                );
                Ok(self.respond(code, Some(content_type), Body::from(body)))
            }
        }
    }

    /// Reply with the canonical reason phrase as text.
    pub fn status_code(&mut self, code: StatusCode) -> Response {
        self.status(code, code.canonical_reason().unwrap_or_default())
    }

    /// Reply with formatted text.
    ///
    /// ```rust,ignore
    /// s.statusf(StatusCode::NOT_FOUND, format_args!("user {id} not found"))
    /// ```
    pub fn statusf(&mut self, code: StatusCode, args: fmt::Arguments<'_>) -> Response {
        self.status(code, fmt::format(args))
    }

    fn text(&mut self, code: StatusCode, text: &str) -> Response {
        tracing::debug!(target: "restwire", "Writing text body: {text}");
        self.response_headers
            .insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static(NOSNIFF));
        let mut body = String::with_capacity(text.len() + 1);
        body.push_str(text);
        body.push('\n');
        self.respond(code, Some(TEXT_CONTENT_TYPE), Body::from(body))
    }

    fn respond(
        &mut self,
        code: StatusCode,
        content_type: Option<&'static str>,
        body: Body,
    ) -> Response {
        tracing::debug!(target: "restwire", "Writing header: {}", code.as_u16());
        let mut response = Response::new(body);
        *response.status_mut() = code;
        *response.headers_mut() = std::mem::take(&mut self.response_headers);
        if let Some(content_type) = content_type {
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        response
    }

    /// Path variables extracted by the router.
    pub fn vars(&self) -> &HashMap<String, String> {
        &self.vars
    }

    /// Look up `key` as a path variable, then as a query parameter, then
    /// fall back to `default`. Empty values count as missing.
    pub fn var(&self, key: &str, default: &str) -> String {
        if let Some(value) = self.vars.get(key).filter(|v| !v.is_empty()) {
            return value.clone();
        }
        if let Some(value) = self.form_value(key) {
            return value;
        }
        default.to_string()
    }

    fn form_value(&self, key: &str) -> Option<String> {
        let query = self.parts.uri.query()?;
        form_urlencoded::parse(query.as_bytes())
            .find(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.into_owned())
    }

    /// Client IP, preferring the first `X-Forwarded-For` entry over the
    /// transport peer address.
    pub fn remote_host(&self) -> Result<IpAddr, SessionError> {
        let forwarded_for = self
            .parts
            .headers
            .get(X_FORWARDED_FOR)
            .and_then(|v| v.to_str().ok());
        remote_host(forwarded_for, self.remote_addr.as_deref())
    }
}
