use crate::transport::http::types::{AppState, HealthResponse, MessageResponse};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy (store reachable)", body = HealthResponse),
        (status = 503, description = "Service is unhealthy (store unreachable)", body = HealthResponse)
    )
)]
pub async fn healthcheck_handler(State(state): State<AppState>) -> impl IntoResponse {
    let db = state.service.store().ping().await;

    let mut resp = HealthResponse {
        status: "healthy".to_string(),
        database_connected: db.is_ok(),
        blockchain_connected: false,
        latest_block: None,
        chain_id: None,
        error: None,
    };

    // The chain is optional: it only degrades the report, never the status.
    if let Some(chain) = &state.chain {
        match chain.block_number().await {
            Ok(block) => {
                resp.blockchain_connected = true;
                resp.latest_block = Some(block);
                resp.chain_id = chain.chain_id().await.ok();
            }
            Err(e) => tracing::debug!(error = %e, rpc = chain.url(), "chain unreachable"),
        }
    }

    match db {
        Ok(()) => (StatusCode::OK, Json(resp)).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "health check: store unreachable");
            resp.status = "unhealthy".to_string();
            resp.error = Some(format!("Database ping failed: {}", e));
            (StatusCode::SERVICE_UNAVAILABLE, Json(resp)).into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service banner", body = MessageResponse))
)]
pub async fn root_handler() -> impl IntoResponse {
    Json(MessageResponse {
        message: "BanKa API - Event payment system".to_string(),
    })
}
