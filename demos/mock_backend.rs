//! Fake dashboard backend for manual runs of the gateway.
//!
//! Run with `cargo run --example mock_backend`, then start the gateway with
//! `--backend-url http://127.0.0.1:8000`.

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::stream::{self, Stream};
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Deserialize)]
struct HealthQuery {
    target: Option<String>,
}

#[derive(Deserialize)]
struct StreamQuery {
    file: String,
}

async fn servers() -> Json<Value> {
    Json(json!([
        {"id": "web-1", "host": "10.0.0.11", "status": "online"},
        {"id": "web-2", "host": "10.0.0.12", "status": "online"},
        {"id": "worker-1", "host": "10.0.0.21", "status": "offline"},
    ]))
}

async fn deploy(Json(body): Json<Value>) -> impl IntoResponse {
    let server = body["serverId"].as_str().unwrap_or("unknown").to_string();
    (
        StatusCode::ACCEPTED,
        Json(json!({
            "message": "Deployment started",
            "log_file": format!("deploy-{}.log", server),
        })),
    )
}

async fn logs() -> Json<Value> {
    Json(json!(["deploy-web-1.log", "deploy-web-2.log"]))
}

async fn log_file(Path(file): Path<String>) -> impl IntoResponse {
    if !file.ends_with(".log") {
        return (StatusCode::NOT_FOUND, "Log not found".to_string());
    }
    (
        StatusCode::OK,
        format!("[{file}] pulling\n[{file}] building\n[{file}] done\n"),
    )
}

async fn health(Query(q): Query<HealthQuery>) -> Json<Value> {
    let target = q.target.unwrap_or_else(|| "google.co.id".to_string());
    Json(json!({
        "ping_output": format!("PING {target}: 3 packets transmitted, 3 received"),
        "dns_output": format!("{target} has address 203.0.113.7"),
    }))
}

async fn validate_password(Json(body): Json<Value>) -> impl IntoResponse {
    if body["password"].as_str() == Some("hunter2") {
        (StatusCode::OK, Json(json!({"valid": true})))
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"valid": false, "detail": "Invalid password"})),
        )
    }
}

async fn stream_log(
    Query(q): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let ticks = stream::unfold(0u64, move |n| {
        let file = q.file.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            let event = Event::default().data(format!("[{file}] step {n}"));
            Some((Ok(event), n + 1))
        }
    });
    Sse::new(ticks).keep_alive(KeepAlive::default())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let app = Router::new()
        .route("/api/servers", get(servers))
        .route("/api/deploy", post(deploy))
        .route("/api/logs", get(logs))
        .route("/api/logs/{file}", get(log_file))
        .route("/api/health", get(health))
        .route("/api/validate-password", post(validate_password))
        .route("/api/stream-log", get(stream_log));

    let addr = SocketAddr::from(([127, 0, 0, 1], 8000));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Mock dashboard backend listening");
    axum::serve(listener, app).await?;
    Ok(())
}
