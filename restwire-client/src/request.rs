//! Low-level request builder.

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use url::Url;

use crate::auth::Auth;
use crate::body::RequestBody;
use crate::client::Client;
use crate::error::ClientError;
use crate::response::Response;

/// A single request built up step by step.
///
/// Sending performs exactly one round trip: the response is not validated
/// against the client's [`Auth`] and never retried. Errors from building
/// the URL or headers are reported when the request is sent.
///
/// ```ignore
/// let res = client
///     .new_request("/users")
///     .join("alice")
///     .param("fields", "email")
///     .header("x-request-id", "42")
///     .get()
///     .await?;
/// ```
#[derive(Debug)]
pub struct RequestBuilder<'c, A = ()> {
    client: &'c Client<A>,
    target: Result<Target, ClientError>,
}

#[derive(Debug)]
struct Target {
    url: Url,
    headers: HeaderMap,
}

impl<'c, A: Auth> RequestBuilder<'c, A> {
    pub(crate) fn new(client: &'c Client<A>, url: String) -> Self {
        let target = Url::parse(&url)
            .map(|url| Target {
                url,
                headers: HeaderMap::new(),
            })
            .map_err(|e| ClientError::InvalidRequest(format!("invalid URL {url:?}: {e}")));
        Self { client, target }
    }

    /// Append path segments. `segment` may contain several `/`-separated parts.
    pub fn join(mut self, segment: &str) -> Self {
        let mut cannot_be_base = false;
        if let Ok(target) = &mut self.target {
            match target.url.path_segments_mut() {
                Ok(mut segments) => {
                    segments
                        .pop_if_empty()
                        .extend(segment.split('/').filter(|s| !s.is_empty()));
                }
                Err(()) => cannot_be_base = true,
            }
        }
        if cannot_be_base {
            self.target = Err(ClientError::InvalidRequest(
                "URL cannot have path segments".to_string(),
            ));
        }
        self
    }

    /// Set query parameter `name`, replacing any earlier values.
    pub fn param(mut self, name: &str, value: &str) -> Self {
        if let Ok(target) = &mut self.target {
            let kept: Vec<(String, String)> = target
                .url
                .query_pairs()
                .filter(|(k, _)| k != name)
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            target
                .url
                .query_pairs_mut()
                .clear()
                .extend_pairs(kept)
                .append_pair(name, value);
        }
        self
    }

    /// Set header `name`, replacing any earlier values.
    ///
    /// An explicit `Accept` header is sent as given; the client's default
    /// `Accept` only applies when none is set.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let Ok(target) = &mut self.target {
            let parsed = HeaderName::try_from(name)
                .map_err(|e| e.to_string())
                .and_then(|n| {
                    HeaderValue::try_from(value)
                        .map(|v| (n, v))
                        .map_err(|e| e.to_string())
                });
            match parsed {
                Ok((name, value)) => {
                    target.headers.insert(name, value);
                }
                Err(e) => {
                    self.target = Err(ClientError::InvalidRequest(format!(
                        "invalid header {name:?}: {e}"
                    )));
                }
            }
        }
        self
    }

    /// The URL the request will be sent to.
    pub fn url(&self) -> Option<&str> {
        self.target.as_ref().ok().map(|t| t.url.as_str())
    }

    pub async fn send<'a, B: Into<RequestBody<'a>>>(
        self,
        method: Method,
        body: B,
    ) -> Result<Response, ClientError> {
        let target = self.target?;
        let payload = body.into().into_payload(self.client.is_protobuf()).await?;
        self.client
            .send(&method, target.url.as_str(), &target.headers, &payload)
            .await
    }

    pub async fn get(self) -> Result<Response, ClientError> {
        self.send(Method::GET, RequestBody::Empty).await
    }

    pub async fn post<'a, B: Into<RequestBody<'a>>>(
        self,
        body: B,
    ) -> Result<Response, ClientError> {
        self.send(Method::POST, body).await
    }

    pub async fn put<'a, B: Into<RequestBody<'a>>>(
        self,
        body: B,
    ) -> Result<Response, ClientError> {
        self.send(Method::PUT, body).await
    }

    pub async fn delete(self) -> Result<Response, ClientError> {
        self.send(Method::DELETE, RequestBody::Empty).await
    }
}

#[cfg(test)]
mod tests {
    use crate::Client;

    #[test]
    fn test_join_and_param() {
        let client = Client::builder("http://localhost:8080/api").build().unwrap();
        let req = client
            .new_request("/users/")
            .join("alice/keys")
            .param("limit", "10")
            .param("q", "a b")
            .param("limit", "20");
        assert_eq!(
            req.url(),
            Some("http://localhost:8080/api/users/alice/keys?q=a+b&limit=20")
        );
    }

    #[test]
    fn test_join_encodes_segments() {
        let client = Client::builder("http://localhost").build().unwrap();
        let req = client.new_request("files").join("a b");
        assert_eq!(req.url(), Some("http://localhost/files/a%20b"));
    }

    #[test]
    fn test_bad_header_is_deferred() {
        let client = Client::builder("http://localhost").build().unwrap();
        let req = client
            .new_request("/")
            .header("bad header", "x")
            .param("a", "b");
        assert_eq!(req.url(), None);
    }

    #[tokio::test]
    async fn test_bad_header_fails_on_send() {
        let client = Client::builder("http://localhost").build().unwrap();
        let err = client
            .new_request("/")
            .header("x-ok", "bad\nvalue")
            .get()
            .await
            .unwrap_err();
        assert!(matches!(err, crate::ClientError::InvalidRequest(_)));
    }
}
