//! Sample user service.
//!
//! Serves `/users/{id}` with GET, POST and DELETE, in JSON or protobuf
//! depending on the request headers. The store starts with `alice`.
//!
//! Run with: cargo run --bin user-server
//! Log dumps with: RUST_LOG=debug cargo run --bin user-server
//!
//! Test with:
//!   curl http://localhost:8080/users/alice
//!   curl -X POST http://localhost:8080/users/bob \
//!     -H 'Content-Type: application/json' \
//!     -d '{"email": "bob@foo.com", "displayName": "Bob"}'

use std::net::SocketAddr;

use restwire::ServerConfig;
use restwire_examples::{app, seeded_users, server_addr};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let router = app(seeded_users(), ServerConfig::new().json_indent("", "  "));

    let addr = server_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("User service listening on http://{}", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
