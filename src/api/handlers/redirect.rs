//! Handler for short URL redirect.

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, HeaderValue, header},
    response::Redirect,
};
use chrono::Utc;
use serde_json::json;
use std::net::SocketAddr;

use crate::application::services::VisitContext;
use crate::domain::location_event::LocateVisit;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{short_code}`
///
/// # Request Flow
///
/// 1. Resolve the code, applying the validity window and visit cap
/// 2. Check the target is a valid `Location` value
/// 3. Record the visit
/// 4. Queue the visit for geolocation (dropped if the queue is full)
/// 5. Return 307 Temporary Redirect
///
/// A failure to record the visit is logged and does not block the redirect.
///
/// # Errors
///
/// Returns 404 Not Found if the code is unknown or not resolvable right now, and
/// 500 without recording a visit if the stored URL cannot be sent as a header.
pub async fn redirect_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> Result<Redirect, AppError> {
    let now = Utc::now();
    let short_url = state.short_url_service.resolve(&short_code, now).await?;

    if HeaderValue::from_str(&short_url.original_url).is_err() {
        tracing::error!(short_code = %short_url.short_code, "Stored URL is not a valid Location header");
        return Err(AppError::internal(
            "Short URL target cannot be redirected to",
            json!({ "short_code": short_url.short_code }),
        ));
    }

    let context = VisitContext {
        remote_addr: Some(client_ip(&headers, peer, state.behind_proxy).to_string()),
        user_agent: header_value(&headers, header::USER_AGENT),
        referer: header_value(&headers, header::REFERER),
    };

    match state.visit_service.track_visit(&short_url, context, now).await {
        Ok(visit) => {
            let event = LocateVisit::new(visit.id, visit.remote_addr);
            if let Err(e) = state.locate_sender.try_send(event) {
                tracing::warn!(visit_id = visit.id, error = %e, "Location queue unavailable, visit left pending");
            }
        }
        Err(e) => {
            tracing::error!(short_code = %short_url.short_code, error = %e, "Failed to track visit");
        }
    }

    Ok(Redirect::temporary(&short_url.original_url))
}
