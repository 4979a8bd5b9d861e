use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use prometheus_client::encoding::text::encode;
use prometheus_client::registry::Registry;

/// `GET /metrics` serving the process's Prometheus text-format registry.
pub fn router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/metrics", get(serve_metrics))
        .with_state(registry)
}

async fn serve_metrics(State(registry): State<Arc<Registry>>) -> String {
    let mut buffer = String::new();
    encode(&mut buffer, &registry).expect("encoding a prometheus-client registry never fails");
    buffer
}
