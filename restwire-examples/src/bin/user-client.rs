//! Client walk-through against `user-server`.
//!
//! Usage:
//!   # First, start the server in another terminal:
//!   cargo run --bin user-server
//!
//!   # Then run the client (defaults to http://localhost:8080):
//!   cargo run --bin user-client
//!
//!   # Or specify a custom server URL:
//!   cargo run --bin user-client -- http://localhost:9000

use std::env;

use restwire_client::{Client, ClientError, RequestBody};
use restwire_examples::User;
use tracing_subscriber::EnvFilter;

async fn walk_through(client: &Client, id: &str) -> anyhow::Result<()> {
    let path = format!("/users/{id}");

    let alice: User = client.get("/users/alice").await?.decode()?;
    println!("  GET alice -> {:?}", alice.email);

    let user = User::new(&format!("{id}@foo.com"), id);
    let res = client.post(&path, RequestBody::message(&user)).await?;
    println!("  POST {id} -> {}", res.status());

    let fetched: User = client.get(&path).await?.decode()?;
    anyhow::ensure!(fetched == user, "stored user differs: {fetched:?}");
    println!("  GET {id} -> {:?}", fetched.display_name);

    let res = client.delete(&path).await?;
    println!("  DELETE {id} -> {}", res.status());

    let res = client.get(&path).await?;
    anyhow::ensure!(res.status() == 404, "expected 404, got {}", res.status());
    println!("  GET {id} -> {}", res.status());

    // A JSON body without the required email is rejected by the server.
    let res = client
        .post(&path, RequestBody::raw_json(r#"{"displayName":"nobody"}"#))
        .await?;
    println!("  POST without email -> {}", res.status());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    // Check command line args first, then SERVER_URL env var, then default
    let base_url = env::args()
        .nth(1)
        .or_else(|| env::var("SERVER_URL").ok())
        .unwrap_or_else(|| "http://localhost:8080".to_string());

    println!("Server URL: {base_url}");

    println!("JSON:");
    let client = Client::builder(base_url.as_str()).build()?;
    walk_through(&client, "bob").await?;

    println!("Protobuf:");
    let client = Client::builder(base_url.as_str()).protobuf().build()?;
    walk_through(&client, "carol").await?;

    // Expected-status mode turns the 404 into an error.
    let strict = Client::builder(base_url.as_str())
        .expect_status(axum::http::StatusCode::OK)
        .build()?;
    match strict.get("/users/nobody").await {
        Err(ClientError::Status { actual, .. }) => println!("Strict GET nobody -> error {actual}"),
        other => anyhow::bail!("expected a status error, got {other:?}"),
    }

    Ok(())
}
