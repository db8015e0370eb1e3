//! Redis-backed location cache.

use super::location_cache::{CacheError, CacheResult, LocationCache};
use crate::domain::entities::VisitLocation;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, error, info, warn};

/// Redis cache for resolved IP locations.
///
/// Locations are stored as JSON under `loc:<ip>`. All operations are fail-open:
/// errors are logged and never propagate to callers.
pub struct RedisCache {
    client: ConnectionManager,
    default_ttl: u64,
    key_prefix: String,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Arguments
    ///
    /// - `redis_url` - Redis connection string (e.g., `"redis://localhost:6379"`)
    /// - `default_ttl_seconds` - TTL used when [`LocationCache::set_location`] gets `None`;
    ///   controlled via `LOCATION_CACHE_TTL_SECONDS`
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection
    /// cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str, default_ttl_seconds: u64) -> CacheResult<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("Connected to Redis location cache");

        Ok(Self {
            client: manager,
            default_ttl: default_ttl_seconds,
            key_prefix: "loc:".to_string(),
        })
    }

    fn build_key(&self, ip: &str) -> String {
        format!("{}{}", self.key_prefix, ip)
    }
}

#[async_trait]
impl LocationCache for RedisCache {
    async fn get_location(&self, ip: &str) -> CacheResult<Option<VisitLocation>> {
        let key = self.build_key(ip);
        let mut conn = self.client.clone();

        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<VisitLocation>(&raw) {
                Ok(location) => {
                    debug!(ip, "Location cache HIT");
                    Ok(Some(location))
                }
                Err(e) => {
                    warn!(ip, error = %e, "Discarding undecodable cached location");
                    Ok(None)
                }
            },
            Ok(None) => {
                debug!(ip, "Location cache MISS");
                Ok(None)
            }
            Err(e) => {
                error!(ip, error = %e, "Redis GET error");
                Ok(None)
            }
        }
    }

    async fn set_location(
        &self,
        ip: &str,
        location: &VisitLocation,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()> {
        let key = self.build_key(ip);
        let ttl = ttl_seconds.unwrap_or(self.default_ttl);

        let payload = match serde_json::to_string(location) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(ip, error = %e, "Failed to encode location for cache");
                return Ok(());
            }
        };

        let mut conn = self.client.clone();
        if let Err(e) = conn.set_ex::<_, _, ()>(&key, payload, ttl).await {
            warn!(ip, error = %e, "Redis SET error");
        } else {
            debug!(ip, ttl, "Location cache SET");
        }

        Ok(())
    }

    async fn invalidate(&self, ip: &str) -> CacheResult<()> {
        let key = self.build_key(ip);
        let mut conn = self.client.clone();

        if let Err(e) = conn.del::<_, i32>(&key).await {
            warn!(ip, error = %e, "Redis DEL error");
        }

        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
