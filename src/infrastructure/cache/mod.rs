//! Cache of resolved IP locations.
//!
//! Provides a [`LocationCache`] trait with two implementations:
//! - [`RedisCache`] - Redis-backed cache
//! - [`NullCache`] - No-op implementation for tests or disabled caching

mod location_cache;
mod null_cache;
mod redis_cache;

pub use location_cache::{CacheError, CacheResult, LocationCache};
pub use null_cache::NullCache;
pub use redis_cache::RedisCache;

#[cfg(test)]
pub use location_cache::MockLocationCache;
