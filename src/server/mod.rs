// src/server/mod.rs

//! Development HTTP server with live reload.
//!
//! Static files come from tower-http's `ServeDir`; HTML responses get the
//! reload client injected; `/__livereload` is the WebSocket the client
//! listens on.

pub mod client;
pub mod reload;

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::{StatusCode, header};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tower_http::services::ServeDir;
use tracing::{debug, info, warn};

pub use reload::{ReloadHub, ReloadMessage};

/// Bind the listening socket. Done before `serve` reports success so a busy
/// port fails the task.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener> {
    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("binding {host}:{port}"))?;
    Ok(listener)
}

/// Routes for serving `root` with live reload.
pub fn router(root: &Path, hub: ReloadHub) -> Router {
    Router::new()
        .route("/__livereload", get(ws_handler))
        .route("/__livereload.js", get(client_script_handler))
        .fallback_service(ServeDir::new(root))
        .layer(middleware::map_response(inject_reload_script))
        .with_state(hub)
}

/// Serve until the process exits.
pub async fn run(listener: TcpListener, app: Router) -> Result<()> {
    let addr: Option<SocketAddr> = listener.local_addr().ok();
    if let Some(addr) = addr {
        info!(url = %format!("http://{addr}/"), "serving site");
    }
    axum::serve(listener, app).await.context("http server")?;
    Ok(())
}

async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<ReloadHub>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

async fn handle_socket(mut socket: WebSocket, hub: ReloadHub) {
    let mut rx = hub.subscribe();
    debug!(clients = hub.subscriber_count(), "live-reload client connected");

    if send_message(&mut socket, ReloadMessage::Connected).await.is_err() {
        return;
    }

    loop {
        match rx.recv().await {
            Ok(msg) => {
                if send_message(&mut socket, msg).await.is_err() {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "live-reload client lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

async fn send_message(socket: &mut WebSocket, msg: ReloadMessage) -> Result<()> {
    let json = serde_json::to_string(&msg)?;
    socket.send(Message::Text(json.into())).await?;
    Ok(())
}

async fn client_script_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        client::CLIENT_SCRIPT,
    )
}

async fn inject_reload_script(response: Response) -> Response {
    let is_html = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/html"));
    if !is_html {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(error = %err, "failed to buffer html response");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let html = client::inject_script_tag(&String::from_utf8_lossy(&bytes));
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(html))
}
