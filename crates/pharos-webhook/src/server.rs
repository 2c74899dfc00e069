//! axum binding for [`WebhookHandler`].

use std::net::SocketAddr;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use tokio::sync::oneshot;
use tracing::{error, info};

use crate::handler::{WebhookHandler, WebhookResponse};

/// Normalizes a route path to start with `/`.
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// A router exposing `POST <path>`.
pub fn router(handler: WebhookHandler, path: &str) -> Router {
    Router::new()
        .route(&normalize_path(path), post(webhook))
        .with_state(handler)
}

async fn webhook(State(handler): State<WebhookHandler>, body: Bytes) -> Response {
    handler.handle(&body).await.into_response()
}

impl IntoResponse for WebhookResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.body)).into_response()
    }
}

/// A running webhook server.
///
/// Dropping the handle without calling [`shutdown`](Self::shutdown) leaves
/// the server running until the runtime stops.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    path: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Stops accepting requests.
    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Binds `addr` and serves `handler` at `path` on a spawned task.
pub async fn serve(
    addr: &str,
    path: &str,
    handler: WebhookHandler,
) -> std::io::Result<ServerHandle> {
    let path = normalize_path(path);
    let app = router(handler, &path);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;

    info!(addr = %local_addr, path = %path, "Webhook server listening");

    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        });
        if let Err(e) = server.await {
            error!(error = %e, "Webhook server error");
        }
        info!("Webhook server stopped");
    });

    Ok(ServerHandle {
        local_addr,
        path,
        shutdown_tx: Some(shutdown_tx),
    })
}
