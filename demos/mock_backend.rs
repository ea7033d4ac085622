//! Minimal backend for trying the forwarder locally.
//!
//! ```text
//! cargo run --example mock_backend
//! cargo run -- --bind 127.0.0.1:8080
//! curl -X POST localhost:8080/anything -d '{"hello":"world"}'
//! ```

use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;

async fn echo(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({ "ok": true, "received": body }))
}

async fn fail() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "backend failure")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let app = Router::new()
        .route("/", post(echo))
        .route("/fail", post(fail));

    let addr = SocketAddr::from(([127, 0, 0, 1], 8081));
    println!("Mock backend listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
