//! API key entity.

use chrono::{DateTime, Utc};

/// A stored API key.
///
/// The raw token is never persisted; `key_hash` is its HMAC and `key_prefix`
/// the first characters, kept for listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    pub id: i64,
    pub key_hash: String,
    pub key_prefix: String,
    pub expiration_date: Option<DateTime<Utc>>,
    pub enabled: bool,
    pub date_created: DateTime<Utc>,
}

impl ApiKey {
    /// A key is valid while enabled and not past its expiration date (inclusive).
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.enabled && self.expiration_date.is_none_or(|exp| now <= exp)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration_date.is_some_and(|exp| now > exp)
    }
}

/// Input for persisting a freshly generated key.
#[derive(Debug, Clone)]
pub struct NewApiKey {
    pub key_hash: String,
    pub key_prefix: String,
    pub expiration_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn key(enabled: bool, expiration_date: Option<DateTime<Utc>>) -> ApiKey {
        ApiKey {
            id: 1,
            key_hash: "hash".to_string(),
            key_prefix: "abcd".to_string(),
            expiration_date,
            enabled,
            date_created: Utc::now(),
        }
    }

    #[test]
    fn test_enabled_without_expiration_is_valid() {
        assert!(key(true, None).is_valid(Utc::now()));
    }

    #[test]
    fn test_disabled_is_invalid() {
        assert!(!key(false, None).is_valid(Utc::now()));
    }

    #[test]
    fn test_expiration_is_inclusive() {
        let now = Utc::now();
        let k = key(true, Some(now));

        assert!(k.is_valid(now));
        assert!(!k.is_valid(now + Duration::seconds(1)));
        assert!(k.is_expired(now + Duration::seconds(1)));
        assert!(!k.is_expired(now));
    }
}
