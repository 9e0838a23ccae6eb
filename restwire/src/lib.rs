//! # restwire
//!
//! A per-request session facade for REST endpoints built with [Axum](https://github.com/tokio-rs/axum),
//! speaking JSON or protobuf from the same handler.
//!
//! ## Features
//!
//! - **Content negotiation:** request bodies are decoded as protobuf when the
//!   `Content-Type` says so, replies are encoded as protobuf when the `Accept`
//!   header (or, failing that, the request's own `Content-Type`) asks for it.
//!   Everything else is JSON.
//! - **Axum-native:** [`Session`] is a regular `FromRequest` extractor and
//!   [`Session::status`] returns an axum `Response`.
//! - **Required fields:** messages that declare required fields are checked on
//!   every decode, whichever representation arrived.
//! - **Variables:** [`Session::var`] looks in the path, then the query, then a default.
//!
//! ## Getting Started
//!
//! ```rust,ignore
//! use axum::{Router, routing::any};
//! use restwire::prelude::*;
//!
//! async fn user(mut s: Session) -> Response {
//!     match *s.method() {
//!         Method::GET => s.status(StatusCode::OK, Reply::message(&load(&s.var("id", "")))),
//!         _ => s.status_code(StatusCode::METHOD_NOT_ALLOWED),
//!     }
//! }
//!
//! let app = Router::new()
//!     .route("/users/{id}", any(user))
//!     .layer(RestLayer::new(ServerConfig::new()));
//! ```

pub mod config;
pub mod error;
pub mod layer;
mod remote;
pub mod reply;
pub mod session;

pub use config::ServerConfig;
pub use error::{DecodeError, EncodeError, RequiredFieldError, SessionError};
pub use layer::{RestLayer, RestService};
pub use reply::Reply;
pub use session::{Session, X_FORWARDED_FOR};

pub use restwire_core::{
    JSON_CONTENT_TYPE, JsonStyle, Negotiation, PROTOBUF_CONTENT_TYPES, Representation,
    TEXT_CONTENT_TYPE, WireMessage,
};

// Re-export several crates
pub use prost;
pub use serde;

pub mod prelude {
    //! The most common types for writing handlers.
    pub use crate::config::ServerConfig;
    pub use crate::error::{DecodeError, SessionError};
    pub use crate::layer::RestLayer;
    pub use crate::reply::Reply;
    pub use crate::session::Session;
    pub use axum::http::{Method, StatusCode};
    pub use axum::response::Response;
    pub use restwire_core::WireMessage;
}
