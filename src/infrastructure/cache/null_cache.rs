//! No-op location cache.

use super::location_cache::{CacheResult, LocationCache};
use crate::domain::entities::VisitLocation;
use async_trait::async_trait;
use tracing::debug;

/// A cache that never stores anything.
///
/// Used when Redis is not configured, when the connection fails at startup,
/// and in tests.
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        debug!("Using NullCache (location caching disabled)");
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocationCache for NullCache {
    async fn get_location(&self, _ip: &str) -> CacheResult<Option<VisitLocation>> {
        Ok(None)
    }

    async fn set_location(
        &self,
        _ip: &str,
        _location: &VisitLocation,
        _ttl_seconds: Option<u64>,
    ) -> CacheResult<()> {
        Ok(())
    }

    async fn invalidate(&self, _ip: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_cache_never_hits() {
        let cache = NullCache::new();
        let location = VisitLocation {
            country_code: Some("NL".to_string()),
            ..Default::default()
        };

        cache
            .set_location("203.0.113.1", &location, None)
            .await
            .unwrap();

        assert!(cache.get_location("203.0.113.1").await.unwrap().is_none());
        assert!(cache.health_check().await);
    }
}
