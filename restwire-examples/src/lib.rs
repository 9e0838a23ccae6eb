use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::routing::any;
use restwire::prelude::*;
use restwire::RequiredFieldError;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// A user account.
///
/// `email` is a required field: a JSON document without it is rejected just
/// like a protobuf body missing it.
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[prost(string, optional, tag = "1")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[prost(string, optional, tag = "2")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl WireMessage for User {
    fn check_required(&self) -> Result<(), RequiredFieldError> {
        if self.email.is_none() {
            return Err(RequiredFieldError::new("User", "email"));
        }
        Ok(())
    }
}

impl User {
    pub fn new(email: &str, display_name: &str) -> Self {
        Self {
            email: Some(email.to_string()),
            display_name: Some(display_name.to_string()),
        }
    }
}

/// In-memory user store keyed by id.
pub type Users = Arc<RwLock<HashMap<String, User>>>;

/// A store holding the `alice` account.
pub fn seeded_users() -> Users {
    let mut users = HashMap::new();
    users.insert("alice".to_string(), User::new("alice@foo.com", "Alice"));
    Arc::new(RwLock::new(users))
}

pub async fn user_handler(State(users): State<Users>, mut s: Session) -> Response {
    let id = s.var("id", "");
    match *s.method() {
        Method::GET => {
            let users = users.read().await;
            match users.get(&id) {
                Some(user) => s.status(StatusCode::OK, Reply::message(user)),
                None => s.status(StatusCode::NOT_FOUND, ()),
            }
        }
        Method::POST => match s.decode::<User>().await {
            Ok(user) => {
                users.write().await.insert(id, user);
                s.status(StatusCode::OK, ())
            }
            Err(_) => s.status(StatusCode::BAD_REQUEST, ()),
        },
        Method::DELETE => match users.write().await.remove(&id) {
            Some(_) => s.status(StatusCode::OK, ()),
            None => s.status(StatusCode::NOT_FOUND, ()),
        },
        _ => s.status(StatusCode::METHOD_NOT_ALLOWED, ()),
    }
}

/// The user service router.
pub fn app(users: Users, config: ServerConfig) -> Router {
    Router::new()
        .route("/users/{id}", any(user_handler))
        .layer(RestLayer::new(config))
        .with_state(users)
}

/// Returns the server address from PORT env var, defaulting to 8080.
///
/// # Example
///
/// ```ignore
/// let addr = restwire_examples::server_addr()?;
/// let listener = tokio::net::TcpListener::bind(addr).await?;
/// ```
pub fn server_addr() -> anyhow::Result<SocketAddr> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".into());
    let addr = format!("0.0.0.0:{port}").parse()?;
    Ok(addr)
}
