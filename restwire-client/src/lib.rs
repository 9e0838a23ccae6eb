//! HTTP client for restwire services.
//!
//! This crate provides a client for REST endpoints that speak JSON or
//! protobuf, designed to work with servers built using `restwire`.
//!
//! ## Features
//!
//! - Binary-capable messages sent and decoded as protobuf or JSON, per client
//! - Raw bytes, readers, pre-encoded JSON and plain `serde` values as bodies
//! - Pluggable [`Auth`] with a single retry after credential invalidation
//! - Optional expected-status assertion
//! - Request/response dumps at `debug` level
//!
//! ## Example
//!
//! ```ignore
//! use restwire_client::{Client, RequestBody};
//!
//! let client = Client::builder("http://localhost:8080")
//!     .protobuf()
//!     .build()?;
//!
//! let user = User { email: Some("bob@foo.com".into()), display_name: Some("Bob".into()) };
//! client.post("/users/bob", RequestBody::message(&user)).await?;
//!
//! let res = client.get("/users/bob").await?;
//! let user: User = res.decode()?;
//! ```

mod auth;
mod body;
mod builder;
mod client;
mod dump;
mod error;
mod request;
mod response;
pub mod transport;

pub use auth::{Auth, BearerToken};
pub use body::RequestBody;
pub use builder::{ClientBuilder, DEFAULT_TIMEOUT};
pub use client::Client;
pub use error::{AuthError, AuthStage, ClientBuildError, ClientError};
pub use request::RequestBuilder;
pub use response::Response;
pub use transport::{HyperTransport, HyperTransportBuilder};

pub use restwire_core::{DecodeError, EncodeError, RequiredFieldError, WireMessage};

// Re-export several crates
pub use prost;
pub use serde;
