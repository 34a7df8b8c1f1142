//! Status and Prometheus endpoints of the bridge.

pub mod metrics;
pub mod state;

use std::net::SocketAddr;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::web::metrics::Metrics;
use crate::web::state::BridgeState;

#[derive(Clone)]
pub struct AppState {
    pub bridge_state: BridgeState,
    pub metrics_handle: PrometheusHandle,
}

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub port: u16,
    pub enabled: bool,
}

/// Binds the listener and serves in the background.
pub async fn start_web_server(config: WebConfig, bridge_state: BridgeState) -> std::io::Result<()> {
    if !config.enabled {
        info!("Web server is disabled");
        return Ok(());
    }

    let metrics_handle = metrics::init_metrics().map_err(std::io::Error::other)?;
    Metrics::set_bridge_info(env!("CARGO_PKG_VERSION"));

    let app = router(AppState {
        bridge_state,
        metrics_handle,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("Web server listening on http://{addr}");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Web server error: {e}");
        }
    });

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/status", get(api_status_handler))
        .route("/api/entities", get(api_entities_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler(State(state): State<AppState>) -> Response {
    if state.bridge_state.summary().is_healthy() {
        (StatusCode::OK, "OK").into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "UNHEALTHY").into_response()
    }
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    Metrics::set_uptime(state.bridge_state.start_time());
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        state.metrics_handle.render(),
    )
        .into_response()
}

async fn api_status_handler(State(state): State<AppState>) -> Response {
    let summary = state.bridge_state.summary();
    Json(serde_json::json!({
        "status": if summary.is_healthy() { "ok" } else { "degraded" },
        "uptime": summary.uptime_display(),
        "summary": summary,
    }))
    .into_response()
}

async fn api_entities_handler(State(state): State<AppState>) -> Response {
    Json(state.bridge_state.entities()).into_response()
}
