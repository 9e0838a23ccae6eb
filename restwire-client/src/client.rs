//! The restwire client.
//!
//! This module provides [`Client`], which sends one logical call per method
//! invocation:
//!
//! ```text
//! serialize -> authorize -> send -> validate -> (invalidate -> resend) -> return
//! ```
//!
//! Validation and the single retry only happen on the top-level
//! [`request`](Client::request), [`get`](Client::get), [`post`](Client::post),
//! [`put`](Client::put) and [`delete`](Client::delete) calls. A
//! [`RequestBuilder`] sends exactly one round trip.

use std::time::{Duration, Instant};

use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method, Request, StatusCode};
use restwire_core::Representation;

use crate::auth::Auth;
use crate::body::{Payload, RequestBody};
use crate::builder::ClientBuilder;
use crate::dump;
use crate::error::{AuthStage, ClientError};
use crate::request::RequestBuilder;
use crate::response::Response;
use crate::transport::HyperTransport;

/// Where a logical call stands in its validate-and-retry cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Attempt {
    First,
    RetryAfterInvalidate,
}

impl Attempt {
    /// State to move to when the server rejects the credentials, `None` once
    /// the single retry has been spent.
    fn after_rejection(self) -> Option<Attempt> {
        match self {
            Attempt::First => Some(Attempt::RetryAfterInvalidate),
            Attempt::RetryAfterInvalidate => None,
        }
    }
}

/// HTTP client for JSON/protobuf REST services.
///
/// The client is generic over `A`: the [`Auth`] capability. This defaults to
/// `()` (no credentials).
///
/// Use [`ClientBuilder`] or [`Client::builder`] to create an instance.
///
/// # Example
///
/// ```ignore
/// use restwire_client::{BearerToken, Client, RequestBody};
///
/// let client = Client::builder("http://localhost:8080")
///     .protobuf()
///     .auth(BearerToken::new("s3cret"))
///     .build()?;
///
/// let user: User = client.get("/users/alice").await?.decode()?;
/// client.put("/users/alice", RequestBody::message(&user)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Client<A = ()> {
    /// HTTP transport.
    transport: HyperTransport,
    /// Base URL without a trailing slash.
    base_url: String,
    /// Send and decode binary-capable values as protobuf.
    protobuf: bool,
    /// Fail calls whose response status differs.
    expect_status: Option<StatusCode>,
    /// Deadline for a single round trip.
    timeout: Option<Duration>,
    auth: A,
}

impl Client<()> {
    /// Equivalent to `ClientBuilder::new(base_url)`.
    pub fn builder<S: Into<String>>(base_url: S) -> ClientBuilder<()> {
        ClientBuilder::new(base_url)
    }
}

impl<A> Client<A> {
    pub(crate) fn new(
        transport: HyperTransport,
        base_url: String,
        protobuf: bool,
        expect_status: Option<StatusCode>,
        timeout: Option<Duration>,
        auth: A,
    ) -> Self {
        Self {
            transport,
            base_url,
            protobuf,
            expect_status,
            timeout,
            auth,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_protobuf(&self) -> bool {
        self.protobuf
    }

    pub fn auth(&self) -> &A {
        &self.auth
    }

    /// A copy of this client without credentials, sharing the connection pool.
    ///
    /// An [`Auth`] implementation that must call the server itself (to log in
    /// again, say) uses this instead of the client it is installed on.
    pub fn without_auth(&self) -> Client<()> {
        Client {
            transport: self.transport.clone(),
            base_url: self.base_url.clone(),
            protobuf: self.protobuf,
            expect_status: self.expect_status,
            timeout: self.timeout,
            auth: (),
        }
    }

    /// Absolute URL of `path`, which is relative to the base URL.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn accept(&self) -> &'static str {
        Representation::from_flag(self.protobuf).content_type()
    }
}

impl<A: Auth> Client<A> {
    /// Start a low-level request to `path`.
    pub fn new_request(&self, path: &str) -> RequestBuilder<'_, A> {
        RequestBuilder::new(self, self.url(path))
    }

    pub async fn get(&self, path: &str) -> Result<Response, ClientError> {
        self.request(Method::GET, path, RequestBody::Empty).await
    }

    pub async fn post<'a, B: Into<RequestBody<'a>>>(
        &self,
        path: &str,
        body: B,
    ) -> Result<Response, ClientError> {
        self.request(Method::POST, path, body).await
    }

    pub async fn put<'a, B: Into<RequestBody<'a>>>(
        &self,
        path: &str,
        body: B,
    ) -> Result<Response, ClientError> {
        self.request(Method::PUT, path, body).await
    }

    pub async fn delete(&self, path: &str) -> Result<Response, ClientError> {
        self.request(Method::DELETE, path, RequestBody::Empty).await
    }

    /// Send a call, validating the credentials and retrying once after
    /// invalidating them if the server rejected them.
    ///
    /// The body is serialized once; the retry resends the same bytes.
    pub async fn request<'a, B: Into<RequestBody<'a>>>(
        &self,
        method: Method,
        path: &str,
        body: B,
    ) -> Result<Response, ClientError> {
        let start = Instant::now();
        let url = self.url(path);
        let payload = body.into().into_payload(self.protobuf).await?;
        let headers = HeaderMap::new();

        let mut attempt = Attempt::First;
        let response = loop {
            let response = self.send(&method, &url, &headers, &payload).await?;
            let Some(next) = attempt.after_rejection() else {
                break response;
            };
            let valid = self.auth.validate(&response).await.map_err(|err| {
                tracing::error!("Failed to validate auth: {err}");
                ClientError::auth(AuthStage::Validate, err)
            })?;
            if valid {
                break response;
            }
            self.auth.invalidate().await.map_err(|err| {
                tracing::error!("Failed to invalidate auth: {err}");
                ClientError::auth(AuthStage::Invalidate, err)
            })?;
            attempt = next;
        };

        tracing::info!("Requested in {:?}: {} {}", start.elapsed(), method, url);
        Ok(response)
    }

    /// One round trip: authorize, default `Accept`, send, dump, check status.
    pub(crate) async fn send(
        &self,
        method: &Method,
        url: &str,
        headers: &HeaderMap,
        payload: &Payload,
    ) -> Result<Response, ClientError> {
        let mut req = Request::builder()
            .method(method.clone())
            .uri(url)
            .body(payload.bytes.clone())
            .map_err(|e| {
                tracing::error!("Failed to create request: {e}");
                ClientError::InvalidRequest(e.to_string())
            })?;

        if let Some(content_type) = payload.content_type {
            req.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        for name in headers.keys() {
            req.headers_mut().remove(name);
            for value in headers.get_all(name) {
                req.headers_mut().append(name.clone(), value.clone());
            }
        }

        self.auth.authorize(&mut req).await.map_err(|err| {
            tracing::error!("Failed to authorize: {err}");
            ClientError::auth(AuthStage::Authorize, err)
        })?;

        if payload.content_type.is_none() && !req.headers().contains_key(ACCEPT) {
            req.headers_mut()
                .insert(ACCEPT, HeaderValue::from_static(self.accept()));
        }

        dump::log_request(&req);
        let res = self.round_trip(req).await.inspect_err(|err| {
            tracing::error!("Failed to make request: {err}");
        })?;
        dump::log_response(&res);

        if let Some(expected) = self.expect_status {
            if res.status() != expected {
                tracing::error!("Unexpected status code: {}", res.status().as_u16());
                return Err(ClientError::Status {
                    expected,
                    actual: res.status(),
                });
            }
        }

        Ok(Response::new(res, self.protobuf))
    }

    async fn round_trip(
        &self,
        req: Request<Bytes>,
    ) -> Result<http::Response<Bytes>, ClientError> {
        match self.timeout {
            Some(t) => tokio::time::timeout(t, self.transport.request(req))
                .await
                .map_err(|_| ClientError::Transport(format!("request timed out after {t:?}")))?,
            None => self.transport.request(req).await,
        }
    }
}
