use axum::{Json, extract::State, http::HeaderMap, http::StatusCode, response::IntoResponse};
use std::collections::HashMap;

use super::{
    models::{BatchRequest, HealthResponse, StatsResponse},
    state::AppState,
    utils::{read_limited, require_json},
    validation::{BatchValidationError, validate_batch},
};
use crate::api::error::ApiError;

/// Batch fetch endpoint (POST /fetch)
///
/// ## Flow:
/// 1. Require `Content-Type: application/json`
/// 2. Read the body up to `server.api.max_payload_bytes`
/// 3. Decode a JSON array of URL strings, enforce `max_urls_per_batch`
/// 4. Run the batch through the engine; this waits for every URL
/// 5. Return 200 with one result per URL, in completion order
///
/// Failed fetches are part of a successful response. The request only
/// fails on a bad payload or a stopped engine.
pub async fn fetch_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Body,
) -> Result<impl IntoResponse, ApiError> {
    let urls = match decode_batch(&state, &headers, body).await {
        Ok(urls) => urls,
        Err(e) => {
            state.metrics.batch_rejected();
            return Err(e);
        }
    };

    state.metrics.batch_accepted();
    let results = state.engine.run_batch(urls).await?;
    state.metrics.record_results(&results);

    Ok((StatusCode::OK, Json(results)))
}

async fn decode_batch(
    state: &AppState,
    headers: &HeaderMap,
    body: axum::body::Body,
) -> Result<BatchRequest, ApiError> {
    require_json(headers)?;

    let limits = &state.config.server.api;
    let bytes = read_limited(body, limits.max_payload_bytes.as_usize()).await?;

    let urls: BatchRequest = serde_json::from_slice(&bytes)?;
    validate_batch(&urls, limits).map_err(|e| match e {
        BatchValidationError::TooManyUrls { count, limit } => ApiError::TooManyUrls { count, limit },
    })?;

    Ok(urls)
}

/// Health check endpoint (GET /health)
///
/// Reports 503 once the worker pool has been stopped.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let pool_status = if state.engine.is_running() {
        "healthy"
    } else {
        "stopped"
    };

    let mut components = HashMap::new();
    components.insert("api".to_string(), "healthy".to_string());
    components.insert("worker_pool".to_string(), pool_status.to_string());

    let all_healthy = components.values().all(|status| status == "healthy");
    let (status_code, overall_status) = if all_healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    let response = HealthResponse {
        status: overall_status.to_string(),
        components,
        workers: state.engine.worker_count(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (status_code, Json(response))
}

/// Counter snapshot (GET /operators/stats)
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatsResponse {
        counters: state.metrics.snapshot(),
        workers: state.engine.worker_count(),
    })
}
