//! Client builder.
//!
//! Provides a fluent API for configuring and building a [`Client`].

use std::time::Duration;

use http::StatusCode;

use crate::auth::Auth;
use crate::client::Client;
use crate::error::ClientBuildError;
use crate::transport::HyperTransport;

/// Default deadline for a single round trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Builder for creating a [`Client`].
///
/// # Example
///
/// ```ignore
/// use restwire_client::ClientBuilder;
///
/// let client = ClientBuilder::new("http://localhost:8080")
///     .protobuf() // default is JSON
///     .expect_status(http::StatusCode::OK)
///     .build()?;
/// ```
pub struct ClientBuilder<A = ()> {
    /// Base URL for the service (e.g., "http://localhost:8080").
    base_url: String,
    /// Optional pre-configured transport.
    transport: Option<HyperTransport>,
    /// Use protobuf encoding (true) or JSON encoding (false).
    protobuf: bool,
    expect_status: Option<StatusCode>,
    timeout: Option<Duration>,
    auth: A,
}

impl<A> std::fmt::Debug for ClientBuilder<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("base_url", &self.base_url)
            .field("transport", &self.transport.is_some())
            .field("protobuf", &self.protobuf)
            .field("expect_status", &self.expect_status)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientBuilder<()> {
    /// Create a new ClientBuilder with the given base URL.
    ///
    /// The base URL should include the scheme and host, e.g., "http://localhost:8080".
    /// A trailing slash is removed.
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            transport: None,
            protobuf: false,
            expect_status: None,
            timeout: Some(DEFAULT_TIMEOUT),
            auth: (),
        }
    }
}

impl<A> ClientBuilder<A> {
    /// Send and decode binary-capable values as protobuf.
    pub fn protobuf(mut self) -> Self {
        self.protobuf = true;
        self
    }

    /// Send and decode binary-capable values as JSON. This is the default.
    pub fn json(mut self) -> Self {
        self.protobuf = false;
        self
    }

    /// Install an [`Auth`] capability.
    pub fn auth<B: Auth>(self, auth: B) -> ClientBuilder<B> {
        ClientBuilder {
            base_url: self.base_url,
            transport: self.transport,
            protobuf: self.protobuf,
            expect_status: self.expect_status,
            timeout: self.timeout,
            auth,
        }
    }

    /// Fail every call whose response status differs from `status`.
    pub fn expect_status(mut self, status: StatusCode) -> Self {
        self.expect_status = Some(status);
        self
    }

    /// Deadline for a single round trip, response body included.
    ///
    /// Default: 5 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Wait for responses indefinitely.
    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Use a pre-configured transport, e.g. to share a connection pool.
    pub fn transport(mut self, transport: HyperTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the Client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse.
    pub fn build(self) -> Result<Client<A>, ClientBuildError> {
        let base_url = self.base_url.trim_end_matches('/').to_string();
        url::Url::parse(&base_url).map_err(|source| ClientBuildError::InvalidUrl {
            url: base_url.clone(),
            source,
        })?;

        Ok(Client::new(
            self.transport.unwrap_or_default(),
            base_url,
            self.protobuf,
            self.expect_status,
            self.timeout,
            self.auth,
        ))
    }
}
