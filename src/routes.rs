//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{short_code}` - Short URL redirect (public)
//! - `GET  /health`       - Health check: store, location queue, cache (public)
//! - `/rest/*`            - REST API (API key required, except single-step shortening)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket (configurable for proxy deployments)
//! - **Authentication** - `X-Api-Key` or Bearer API key
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::rate_limit::{self, RateLimit};
use crate::api::middleware::{auth, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Builds the router with every route and middleware, without path normalization.
///
/// The rate limiter keys on the peer address, so serve it with
/// `into_make_service_with_connect_info::<SocketAddr>()` (or put
/// `MockConnectInfo` in front of it in tests).
///
/// # Errors
///
/// Returns an error if the rate limit settings are invalid.
pub fn router(state: AppState, limit: RateLimit) -> anyhow::Result<Router> {
    let protected = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));
    let protected = rate_limit::apply(protected, limit)?;

    let key_management = api::routes::key_management_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));
    let key_management = rate_limit::apply(key_management, limit.secure())?;

    let single_step = rate_limit::apply(api::routes::public_routes(), limit)?;
    let redirect = rate_limit::apply(
        Router::new().route("/{short_code}", get(redirect_handler)),
        limit,
    )?;

    let rest = Router::new()
        .merge(single_step)
        .merge(protected)
        .merge(key_management);

    Ok(Router::new()
        .route("/health", get(health_handler))
        .merge(redirect)
        .nest("/rest", rest)
        .with_state(state)
        .layer(tracing::layer()))
}

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `limit` - rate limit settings; with `behind_proxy` the client IP is read
///   from `X-Forwarded-For` / `X-Real-IP` instead of the peer socket address,
///   enable only behind a trusted reverse proxy
///
/// # Errors
///
/// Returns an error if the rate limit settings are invalid.
pub fn app_router(state: AppState, limit: RateLimit) -> anyhow::Result<NormalizePath<Router>> {
    let router = router(state, limit)?;
    Ok(NormalizePathLayer::trim_trailing_slash().layer(router))
}
