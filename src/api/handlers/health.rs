//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Database**: store ping
/// 2. **Location Queue**: channel open, remaining capacity
/// 3. **Cache**: location cache health (always ok when disabled)
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let database = check_database(&state).await;
    let location_queue = check_location_queue(&state);
    let cache = check_cache(&state).await;

    let all_healthy = database.is_ok() && location_queue.is_ok() && cache.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database,
            location_queue,
            cache,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    match state.short_url_service.ping().await {
        Ok(()) => CheckStatus::ok("Connected"),
        Err(e) => CheckStatus::error(format!("Database error: {e}")),
    }
}

fn check_location_queue(state: &AppState) -> CheckStatus {
    if state.locate_sender.is_closed() {
        CheckStatus::error("Location queue is closed")
    } else {
        CheckStatus::ok(format!(
            "Capacity: {}/{}",
            state.locate_sender.capacity(),
            state.locate_sender.max_capacity()
        ))
    }
}

async fn check_cache(state: &AppState) -> CheckStatus {
    if state.location_cache.health_check().await {
        CheckStatus::ok("Location cache available")
    } else {
        CheckStatus::error("Location cache unreachable")
    }
}
