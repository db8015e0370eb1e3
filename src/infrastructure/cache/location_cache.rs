//! Location cache trait and error types.

use async_trait::async_trait;

use crate::domain::entities::VisitLocation;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),

    #[error("Cache operation error: {0}")]
    OperationError(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache of resolved IP locations, keyed by the textual IP address.
///
/// Implementations are fail-open: a broken backend behaves like a permanent miss
/// so location resolution falls through to the provider.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationCache: Send + Sync {
    /// Returns the cached location for `ip`.
    ///
    /// `Ok(None)` on miss. Backend errors are logged and reported as a miss.
    async fn get_location(&self, ip: &str) -> CacheResult<Option<VisitLocation>>;

    /// Stores a location with an optional TTL (implementation default if `None`).
    async fn set_location(
        &self,
        ip: &str,
        location: &VisitLocation,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()>;

    async fn invalidate(&self, ip: &str) -> CacheResult<()>;

    /// Used by the health endpoint.
    async fn health_check(&self) -> bool;
}
