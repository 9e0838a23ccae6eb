//! Pluggable credentials.
//!
//! An [`Auth`] capability attaches credentials to every outgoing request and
//! judges whether the server accepted them. When it reports a rejection, the
//! top-level [`Client`](crate::Client) calls invalidate it and repeats the round
//! trip exactly once.
//!
//! Credential state belongs to the implementation. Methods take `&self`, so a
//! refreshing implementation keeps its token behind its own lock.
//!
//! # Example
//!
//! ```ignore
//! use restwire_client::{Auth, AuthError, Client, Response};
//!
//! struct Session { token: tokio::sync::RwLock<String>, login: Client }
//!
//! impl Auth for Session {
//!     async fn authorize(&self, req: &mut http::Request<bytes::Bytes>) -> Result<(), AuthError> {
//!         let token = self.token.read().await;
//!         req.headers_mut().insert("x-session", token.parse().map_err(|_| AuthError::new("bad token"))?);
//!         Ok(())
//!     }
//!
//!     async fn validate(&self, res: &Response) -> Result<bool, AuthError> {
//!         Ok(res.status() != http::StatusCode::UNAUTHORIZED)
//!     }
//!
//!     async fn invalidate(&self) -> Result<(), AuthError> {
//!         // `login` is a client without auth, so this call cannot re-enter `Session`.
//!         let res = self.login.post("/login", ()).await.map_err(|e| AuthError::new(e.to_string()))?;
//!         *self.token.write().await = res.text().into_owned();
//!         Ok(())
//!     }
//! }
//! ```

use std::future::Future;

use bytes::Bytes;
use http::header::AUTHORIZATION;
use http::{HeaderValue, Request, StatusCode};

use crate::error::AuthError;
use crate::response::Response;

/// Credential strategy used by a [`Client`](crate::Client).
///
/// The unit type `()` is the no-op capability: it attaches nothing and
/// accepts every response.
pub trait Auth: Send + Sync {
    /// Attach credentials to an outgoing request.
    fn authorize(
        &self,
        request: &mut Request<Bytes>,
    ) -> impl Future<Output = Result<(), AuthError>> + Send;

    /// Whether the server accepted the credentials of `response`.
    fn validate(&self, response: &Response) -> impl Future<Output = Result<bool, AuthError>> + Send;

    /// Discard or refresh the stored credentials.
    fn invalidate(&self) -> impl Future<Output = Result<(), AuthError>> + Send;
}

impl Auth for () {
    async fn authorize(&self, _request: &mut Request<Bytes>) -> Result<(), AuthError> {
        Ok(())
    }

    async fn validate(&self, _response: &Response) -> Result<bool, AuthError> {
        Ok(true)
    }

    async fn invalidate(&self) -> Result<(), AuthError> {
        Ok(())
    }
}

/// Static `Authorization: Bearer` credentials.
///
/// A `401 Unauthorized` response fails validation. The token cannot be
/// refreshed, so the retry after invalidation resends the same token.
#[derive(Clone)]
pub struct BearerToken {
    token: String,
}

impl BearerToken {
    pub fn new<S: Into<String>>(token: S) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerToken").finish_non_exhaustive()
    }
}

impl Auth for BearerToken {
    async fn authorize(&self, request: &mut Request<Bytes>) -> Result<(), AuthError> {
        let mut value = HeaderValue::try_from(format!("Bearer {}", self.token))
            .map_err(|_| AuthError::new("bearer token is not a valid header value"))?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }

    async fn validate(&self, response: &Response) -> Result<bool, AuthError> {
        Ok(response.status() != StatusCode::UNAUTHORIZED)
    }

    async fn invalidate(&self) -> Result<(), AuthError> {
        tracing::warn!("Bearer token rejected by server");
        Ok(())
    }
}
