//! API key authentication middleware.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;

use crate::{error::AppError, state::AppState};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Authenticates requests with an API key.
///
/// # Header Format
///
/// ```text
/// X-Api-Key: <key>
/// Authorization: Bearer <key>
/// ```
///
/// `X-Api-Key` wins when both are present.
///
/// # Errors
///
/// Returns `401 Unauthorized` if:
/// - neither header is present
/// - the key is unknown, disabled or expired
///
/// # Example
///
/// ```rust,ignore
/// use axum::{Router, routing::get, middleware};
/// use crate::api::middleware::auth;
///
/// let protected = Router::new()
///     .route("/tags", get(list_tags_handler))
///     .layer(middleware::from_fn_with_state(state.clone(), auth::layer));
/// ```
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let key = extract_key(&mut parts).await.ok_or_else(|| {
        AppError::unauthorized(
            "Unauthorized",
            serde_json::json!({"reason": "X-Api-Key or Authorization header is missing or invalid"}),
        )
    })?;

    let req = Request::from_parts(parts, body);

    st.api_key_service.authenticate(&key).await?;

    Ok(next.run(req).await)
}

async fn extract_key(parts: &mut Parts) -> Option<String> {
    let header_key = parts
        .headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    if header_key.is_some() {
        return header_key;
    }

    AuthBearer::from_request_parts(parts, &())
        .await
        .ok()
        .map(|AuthBearer(token)| token)
        .filter(|t| !t.is_empty())
}
