use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::routing::any;
use bytes::Bytes;
use restwire::prelude::*;
use restwire::{RequiredFieldError, RestLayer};
use restwire_client::{
    Auth, AuthError, AuthStage, BearerToken, Client, ClientError, RequestBody,
    Response as ClientResponse,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct User {
    #[prost(string, optional, tag = "1")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[prost(string, tag = "2")]
    #[serde(default)]
    display_name: String,
}

impl WireMessage for User {
    fn check_required(&self) -> Result<(), RequiredFieldError> {
        if self.email.is_none() {
            return Err(RequiredFieldError::new("User", "email"));
        }
        Ok(())
    }
}

fn bob() -> User {
    User {
        email: Some("bob@foo.com".to_string()),
        display_name: "Bob".to_string(),
    }
}

#[derive(Clone, Default)]
struct Hits(Arc<AtomicUsize>);

impl Hits {
    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

async fn hit(State(hits): State<Hits>, mut s: Session) -> Response {
    hits.0.fetch_add(1, Ordering::SeqCst);
    let auth = s
        .request_header()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none")
        .to_string();
    if auth == "Bearer expired" {
        return s.status_code(StatusCode::UNAUTHORIZED);
    }
    s.status(StatusCode::OK, auth)
}

async fn accept(mut s: Session) -> Response {
    let accept = s
        .request_header()
        .get(axum::http::header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none")
        .to_string();
    s.status(StatusCode::OK, accept)
}

async fn user(mut s: Session) -> Response {
    match *s.method() {
        Method::GET => {
            let user = User {
                email: Some(format!("{}@foo.com", s.var("id", ""))),
                display_name: s.var("name", "anonymous"),
            };
            s.status(StatusCode::OK, Reply::message(&user))
        }
        Method::POST | Method::PUT => match s.decode::<User>().await {
            Ok(user) => s.status(StatusCode::CREATED, Reply::message(&user)),
            Err(err) => s.status(StatusCode::BAD_REQUEST, Reply::error(&err)),
        },
        _ => s.status_code(StatusCode::METHOD_NOT_ALLOWED),
    }
}

async fn echo_bytes(body: Bytes) -> Bytes {
    body
}

async fn gateway_error() -> impl IntoResponse {
    (
        StatusCode::BAD_GATEWAY,
        [(CONTENT_TYPE, "text/html")],
        "<h1>Bad Gateway</h1>",
    )
}

async fn serve(hits: Hits) -> String {
    let app = Router::new()
        .route("/hit", any(hit))
        .route("/accept", any(accept))
        .route("/users/{id}", any(user))
        .route("/bytes", any(echo_bytes))
        .route("/gateway", any(gateway_error))
        .layer(RestLayer::new(ServerConfig::new()))
        .with_state(hits);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    format!("http://{addr}")
}

/// Auth whose `validate` answers come from a script.
#[derive(Clone, Default)]
struct Scripted {
    validations: Arc<Mutex<VecDeque<Result<bool, AuthError>>>>,
    authorizations: Arc<AtomicUsize>,
    invalidations: Arc<AtomicUsize>,
    fail_authorize: bool,
    fail_invalidate: bool,
}

impl Scripted {
    fn validating(answers: impl IntoIterator<Item = Result<bool, AuthError>>) -> Self {
        let scripted = Scripted::default();
        scripted.validations.lock().unwrap().extend(answers);
        scripted
    }

    fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }

    fn authorizations(&self) -> usize {
        self.authorizations.load(Ordering::SeqCst)
    }
}

impl Auth for Scripted {
    async fn authorize(&self, request: &mut http::Request<Bytes>) -> Result<(), AuthError> {
        if self.fail_authorize {
            return Err(AuthError::new("no credentials"));
        }
        let n = self.authorizations.fetch_add(1, Ordering::SeqCst);
        let value = format!("Bearer token-{n}");
        request
            .headers_mut()
            .insert(AUTHORIZATION, value.parse().unwrap());
        Ok(())
    }

    async fn validate(&self, _response: &ClientResponse) -> Result<bool, AuthError> {
        self.validations.lock().unwrap().pop_front().unwrap_or(Ok(true))
    }

    async fn invalidate(&self) -> Result<(), AuthError> {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        if self.fail_invalidate {
            return Err(AuthError::new("refresh failed"));
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_rejected_once_retries_once() {
    let hits = Hits::default();
    let base = serve(hits.clone()).await;
    let auth = Scripted::validating([Ok(false), Ok(true)]);
    let client = Client::builder(base).auth(auth.clone()).build().unwrap();

    let res = client.get("/hit").await.unwrap();

    assert_eq!(hits.count(), 2);
    assert_eq!(auth.invalidations(), 1);
    assert_eq!(auth.authorizations(), 2);
    // the retry carries the refreshed credentials
    assert_eq!(res.text(), "Bearer token-1\n");
}

#[tokio::test]
async fn test_always_rejected_stops_after_one_retry() {
    let hits = Hits::default();
    let base = serve(hits.clone()).await;
    let auth = Scripted::validating(std::iter::repeat_with(|| Ok(false)).take(10));
    let client = Client::builder(base).auth(auth.clone()).build().unwrap();

    let res = client.post("/hit", ()).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(hits.count(), 2);
    assert_eq!(auth.invalidations(), 1);
}

#[tokio::test]
async fn test_validate_error_aborts() {
    let hits = Hits::default();
    let base = serve(hits.clone()).await;
    let auth = Scripted::validating([Err(AuthError::new("cannot tell"))]);
    let client = Client::builder(base).auth(auth.clone()).build().unwrap();

    let err = client.get("/hit").await.unwrap_err();

    assert!(matches!(
        err,
        ClientError::Auth {
            stage: AuthStage::Validate,
            ..
        }
    ));
    assert_eq!(hits.count(), 1);
    assert_eq!(auth.invalidations(), 0);
}

#[tokio::test]
async fn test_invalidate_error_aborts() {
    let hits = Hits::default();
    let base = serve(hits.clone()).await;
    let auth = Scripted {
        fail_invalidate: true,
        ..Scripted::validating([Ok(false)])
    };
    let client = Client::builder(base).auth(auth.clone()).build().unwrap();

    let err = client.delete("/hit").await.unwrap_err();

    assert_eq!(err.to_string(), "failed to invalidate auth: refresh failed");
    assert_eq!(hits.count(), 1);
}

#[tokio::test]
async fn test_authorize_error_sends_nothing() {
    let hits = Hits::default();
    let base = serve(hits.clone()).await;
    let auth = Scripted {
        fail_authorize: true,
        ..Scripted::default()
    };
    let client = Client::builder(base).auth(auth).build().unwrap();

    let err = client.get("/hit").await.unwrap_err();

    assert!(matches!(
        err,
        ClientError::Auth {
            stage: AuthStage::Authorize,
            ..
        }
    ));
    assert_eq!(hits.count(), 0);
}

#[tokio::test]
async fn test_low_level_send_never_retries() {
    let hits = Hits::default();
    let base = serve(hits.clone()).await;
    let auth = Scripted::validating([Ok(false), Ok(false)]);
    let client = Client::builder(base).auth(auth.clone()).build().unwrap();

    let res = client.new_request("/hit").get().await.unwrap();

    assert_eq!(res.text(), "Bearer token-0\n");
    assert_eq!(hits.count(), 1);
    assert_eq!(auth.invalidations(), 0);
}

#[tokio::test]
async fn test_bearer_token_rejected_is_retried_once() {
    let hits = Hits::default();
    let base = serve(hits.clone()).await;
    let client = Client::builder(base)
        .auth(BearerToken::new("expired"))
        .build()
        .unwrap();

    let res = client.get("/hit").await.unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(hits.count(), 2);

    let res = client.without_auth().get("/hit").await.unwrap();
    assert_eq!(res.text(), "none\n");
    assert_eq!(hits.count(), 3);
}

#[tokio::test]
async fn test_expect_status_mismatch() {
    let base = serve(Hits::default()).await;
    let client = Client::builder(base)
        .expect_status(StatusCode::OK)
        .build()
        .unwrap();

    let err = client.delete("/users/bob").await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::METHOD_NOT_ALLOWED));
    assert_eq!(err.to_string(), "405 Method Not Allowed");
}

#[tokio::test]
async fn test_accept_defaults_to_client_mode() {
    let base = serve(Hits::default()).await;

    let json = Client::builder(base.as_str()).build().unwrap();
    let res = json.get("/accept").await.unwrap();
    assert_eq!(res.text(), "application/json\n");

    let proto = Client::builder(base.as_str()).protobuf().build().unwrap();
    let res = proto.get("/accept").await.unwrap();
    assert_eq!(res.text(), "application/protobuf\n");

    // a typed body sets its own content type and no Accept
    let res = proto
        .post("/accept", RequestBody::message(&bob()))
        .await
        .unwrap();
    assert_eq!(res.text(), "none\n");

    // an explicit Accept header wins
    let res = json
        .new_request("/accept")
        .header("accept", "application/x-protobuf")
        .get()
        .await
        .unwrap();
    assert_eq!(res.text(), "application/x-protobuf\n");
}

#[tokio::test]
async fn test_message_round_trip_protobuf() {
    let base = serve(Hits::default()).await;
    let client = Client::builder(base).protobuf().build().unwrap();

    let res = client
        .put("/users/bob", RequestBody::message(&bob()))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.headers()[CONTENT_TYPE], "application/protobuf");
    assert_eq!(res.decode::<User>().unwrap(), bob());

    let res = client.get("/users/carol").await.unwrap();
    assert_eq!(res.headers()[CONTENT_TYPE], "application/protobuf");
    let carol: User = res.decode().unwrap();
    assert_eq!(carol.email.as_deref(), Some("carol@foo.com"));
}

#[tokio::test]
async fn test_message_round_trip_json() {
    let base = serve(Hits::default()).await;
    let client = Client::builder(base).build().unwrap();

    let res = client
        .post("/users/bob", RequestBody::message(&bob()))
        .await
        .unwrap();

    assert_eq!(res.headers()[CONTENT_TYPE], "application/json");
    assert_eq!(res.decode::<User>().unwrap(), bob());

    let res = client
        .new_request("/users")
        .join("dave")
        .param("name", "Dave")
        .get()
        .await
        .unwrap();
    let dave: User = res.decode().unwrap();
    assert_eq!(dave.display_name, "Dave");
}

#[tokio::test]
async fn test_missing_required_field_surfaces_server_text() {
    let base = serve(Hits::default()).await;
    let client = Client::builder(base).build().unwrap();

    let res = client
        .post(
            "/users/bob",
            RequestBody::raw_json(r#"{"displayName":"Bob"}"#),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err = res.decode::<User>().unwrap_err();
    assert_eq!(err.to_string(), "required field User.email not set\n");
}

#[tokio::test]
async fn test_error_page_becomes_error_message() {
    let base = serve(Hits::default()).await;
    let client = Client::builder(base).build().unwrap();

    let res = client.get("/gateway").await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let err = res.decode_json::<serde_json::Value>().unwrap_err();
    assert!(matches!(err, ClientError::UnexpectedBody(_)));
    assert_eq!(err.to_string(), "<h1>Bad Gateway</h1>");
}

#[tokio::test]
async fn test_raw_and_reader_bodies() {
    let base = serve(Hits::default()).await;
    let client = Client::builder(base).build().unwrap();

    let res = client.post("/bytes", vec![0u8, 1, 2]).await.unwrap();
    assert_eq!(res.body().as_ref(), &[0u8, 1, 2][..]);

    let data: &[u8] = b"from a reader";
    let res = client
        .post("/bytes", RequestBody::reader(data))
        .await
        .unwrap();
    assert_eq!(res.text(), "from a reader");
}

#[tokio::test]
async fn test_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = Client::builder(format!("http://{addr}")).build().unwrap();
    let err = client.get("/").await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}

#[tokio::test]
async fn test_transport_as_tower_service() {
    use restwire_client::HyperTransport;
    use tower_service::Service;

    let base = serve(Hits::default()).await;
    let mut transport = HyperTransport::new();
    std::future::poll_fn(|cx| transport.poll_ready(cx))
        .await
        .unwrap();

    let req = axum::http::Request::builder()
        .method("POST")
        .uri(format!("{base}/bytes"))
        .body(Bytes::from_static(b"over tower"))
        .unwrap();
    let res = transport.call(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body().as_ref(), b"over tower");
}
