//! Per-IP rate limiting using a token bucket.

use anyhow::Context;
use axum::Router;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer,
    governor::GovernorConfigBuilder,
    key_extractor::{PeerIpKeyExtractor, SmartIpKeyExtractor},
};

use crate::config::Config;
use crate::state::AppState;

/// Bucket settings for one group of routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Seconds between two replenished tokens.
    pub refill_seconds: u64,
    /// Bucket size.
    pub burst: u32,
    /// Read the client IP from forwarding headers instead of the peer address.
    pub behind_proxy: bool,
}

impl RateLimit {
    pub fn from_config(config: &Config) -> Self {
        Self {
            refill_seconds: config.rate_limit_refill_seconds,
            burst: config.rate_limit_burst,
            behind_proxy: config.behind_proxy,
        }
    }

    /// Tighter bucket for key management routes.
    pub fn secure(self) -> Self {
        Self {
            burst: (self.burst / 10).max(1),
            ..self
        }
    }
}

/// Wraps `router` in a rate limiter.
///
/// Requests exceeding the limit receive `429 Too Many Requests`.
///
/// # Key Extraction
///
/// Without a proxy the key is the socket peer address, so the router must be
/// served with `into_make_service_with_connect_info`. Behind a proxy the
/// `X-Forwarded-For`, `X-Real-IP` and `Forwarded` headers are tried first.
///
/// # Errors
///
/// Returns an error if the settings are rejected by the limiter (zero values).
///
/// # Example
///
/// ```rust,ignore
/// let api = rate_limit::apply(api_routes(), RateLimit::from_config(&config))?;
/// ```
pub fn apply(router: Router<AppState>, limit: RateLimit) -> anyhow::Result<Router<AppState>> {
    if limit.behind_proxy {
        let conf = GovernorConfigBuilder::default()
            .per_second(limit.refill_seconds)
            .burst_size(limit.burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .context("Invalid rate limit settings")?;
        Ok(router.layer(GovernorLayer::new(Arc::new(conf))))
    } else {
        let conf = GovernorConfigBuilder::default()
            .per_second(limit.refill_seconds)
            .burst_size(limit.burst)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .context("Invalid rate limit settings")?;
        Ok(router.layer(GovernorLayer::new(Arc::new(conf))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_keeps_refill_and_shrinks_burst() {
        let base = RateLimit {
            refill_seconds: 2,
            burst: 100,
            behind_proxy: false,
        };
        let secure = base.secure();

        assert_eq!(secure.refill_seconds, 2);
        assert_eq!(secure.burst, 10);
        assert_eq!(
            RateLimit { burst: 3, ..base }.secure().burst,
            1
        );
    }

    #[test]
    fn test_zero_settings_are_rejected() {
        let limit = RateLimit {
            refill_seconds: 0,
            burst: 10,
            behind_proxy: false,
        };
        assert!(apply(Router::new(), limit).is_err());
    }
}
