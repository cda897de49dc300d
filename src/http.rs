//! HTTP endpoint exposing outbox metrics.
//!
//! Serves `/metrics` for Prometheus scraping from a background task.

use axum::{Router, routing::get};
use std::net::SocketAddr;

async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

/// Router serving `GET /metrics`.
pub fn router() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

/// Run the metrics HTTP server on `0.0.0.0:port` until it fails.
pub async fn run_http_server(port: u16) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind metrics endpoint");
            return;
        }
    };
    tracing::info!(%addr, "Metrics endpoint listening");

    if let Err(e) = axum::serve(listener, router()).await {
        tracing::error!(error = %e, "Metrics endpoint stopped");
    }
}
