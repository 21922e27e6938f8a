use crate::{SignalingService, ws_handler};
use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::HeaderValue;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub clients: usize,
    pub rooms: usize,
}

/// HTTP surface of the relay: `GET /ws` upgrades to the signaling socket,
/// `GET /health` reports liveness and current load.
pub fn router(service: SignalingService, allowed_origin: Option<&str>) -> Result<Router> {
    let origin = match allowed_origin {
        Some(origin) => AllowOrigin::exact(
            HeaderValue::from_str(origin)
                .with_context(|| format!("invalid allowed origin '{}'", origin))?,
        ),
        None => AllowOrigin::from(Any),
    };

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(service))
}

async fn health(State(service): State<SignalingService>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok",
        clients: service.registry().live_count(),
        rooms: service.directory().room_count(),
    })
}
