//! Middleware layer that hands the [`ServerConfig`] to every session.
//!
//! ```rust,ignore
//! use axum::{Router, routing::any};
//! use restwire::{RestLayer, ServerConfig};
//!
//! let app = Router::new()
//!     .route("/users/{id}", any(user_handler))
//!     .layer(RestLayer::new(ServerConfig::new().json_indent("", "  ")));
//! ```
//!
//! Sessions extracted without this layer fall back to `ServerConfig::default()`.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::Request;
use tower::{Layer, Service};

use crate::config::ServerConfig;

/// Layer that stores an `Arc<ServerConfig>` in request extensions.
#[derive(Debug, Clone, Default)]
pub struct RestLayer {
    config: Arc<ServerConfig>,
}

impl RestLayer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

impl<S> Layer<S> for RestLayer {
    type Service = RestService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RestService {
            inner,
            config: self.config.clone(),
        }
    }
}

/// Service produced by [`RestLayer`].
#[derive(Debug, Clone)]
pub struct RestService<S> {
    inner: S,
    config: Arc<ServerConfig>,
}

impl<S, B> Service<Request<B>> for RestService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        req.extensions_mut().insert(self.config.clone());
        self.inner.call(req)
    }
}
