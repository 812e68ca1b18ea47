//! HTTP surface for camera uploads.
//!
//! `POST /upload` takes a label photo (multipart `image` field or a raw
//! `image/jpeg` body) and runs it through [`LabelIntake`]; `GET /health`
//! reports liveness and the active distance backend.

pub mod routes;

use crate::core::intake::LabelIntake;
use crate::utils::error::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub use routes::{AppState, NO_IMAGE_MESSAGE, SUCCESS_MESSAGE};

pub fn router(intake: Arc<LabelIntake>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/upload", post(routes::upload))
        .route("/health", get(routes::health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { intake })
}

/// 在指定的 listener 上提供服務，直到收到 Ctrl-C
pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!("🚀 Listening on http://{}", addr);
    tracing::info!("  POST /upload - label photo (multipart 'image' or image/jpeg body)");
    tracing::info!("  GET  /health - health check");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl-C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
