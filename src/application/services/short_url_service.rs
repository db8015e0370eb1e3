//! Short URL creation, resolution and lifecycle management.

use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;

use crate::domain::entities::{
    NewShortUrl, Resolvability, ShortUrl, ShortUrlMeta, ShortUrlMetaPatch, normalize_tag_names,
};
use crate::domain::list_query::ShortUrlsListQuery;
use crate::domain::repositories::ShortUrlRepository;
use crate::error::AppError;
use crate::infrastructure::url_validator::UrlValidator;
use crate::utils::code_generator::{Alphabet, is_reserved, validate_custom_slug};
use crate::utils::long_url::parse_long_url;

/// Upper bound on identifier reservations while looking for a free code.
const MAX_GENERATION_ATTEMPTS: usize = 10;

/// Input for [`ShortUrlService::create`].
#[derive(Debug, Clone, Default)]
pub struct CreateShortUrl {
    pub long_url: String,
    pub custom_slug: Option<String>,
    pub meta: ShortUrlMeta,
    pub tags: Vec<String>,
}

impl CreateShortUrl {
    pub fn new(long_url: impl Into<String>) -> Self {
        Self {
            long_url: long_url.into(),
            ..Self::default()
        }
    }
}

/// Service owning the short URL lifecycle.
///
/// Generated codes are the base-N encoding of a reserved identifier, so two
/// generations never produce the same code under one alphabet. Custom slugs and
/// reserved route segments can still occupy an encoded value; such identifiers
/// are skipped.
pub struct ShortUrlService {
    repository: Arc<dyn ShortUrlRepository>,
    url_validator: Arc<dyn UrlValidator>,
    alphabet: Alphabet,
    schema: String,
    host: String,
}

impl ShortUrlService {
    /// Creates the service.
    ///
    /// `schema` and `host` form the public base of every short URL.
    pub fn new(
        repository: Arc<dyn ShortUrlRepository>,
        url_validator: Arc<dyn UrlValidator>,
        alphabet: Alphabet,
        schema: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            url_validator,
            alphabet,
            schema: schema.into(),
            host: host.into(),
        }
    }

    /// Shortens a long URL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the URL, slug or metadata is invalid, or
    /// the URL fails reachability validation.
    /// Returns [`AppError::Conflict`] if the custom slug is already in use.
    /// Returns [`AppError::Internal`] if no free code was found or on storage errors.
    pub async fn create(&self, request: CreateShortUrl) -> Result<ShortUrl, AppError> {
        let original_url = parse_long_url(&request.long_url)?;
        request.meta.validate()?;

        if let Some(slug) = &request.custom_slug {
            validate_custom_slug(slug)?;
        }

        self.url_validator.validate(&original_url).await?;

        let (id, short_code) = match request.custom_slug {
            Some(slug) => {
                if self.repository.short_code_exists(&slug).await? {
                    return Err(AppError::conflict(
                        "Provided slug is already in use",
                        json!({ "custom_slug": slug }),
                    ));
                }
                (self.repository.next_id().await?, slug)
            }
            None => self.generate_code().await?,
        };

        let short_url = self
            .repository
            .create(NewShortUrl {
                id,
                short_code,
                original_url,
                meta: request.meta,
                tags: normalize_tag_names(request.tags),
            })
            .await?;

        metrics::counter!("short_urls_created_total").increment(1);
        tracing::info!(
            short_code = %short_url.short_code,
            id = short_url.id,
            "Short URL created"
        );

        Ok(short_url)
    }

    /// Reserves identifiers until one encodes to a free, non-reserved code.
    async fn generate_code(&self) -> Result<(i64, String), AppError> {
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let id = self.repository.next_id().await?;
            let code = self.alphabet.encode(id.unsigned_abs());

            if is_reserved(&code) || self.repository.short_code_exists(&code).await? {
                tracing::warn!(attempt, id, code = %code, "Encoded short code unavailable, retrying");
                continue;
            }

            return Ok((id, code));
        }

        Err(AppError::internal(
            "Failed to generate unique short code",
            json!({ "attempts": MAX_GENERATION_ATTEMPTS }),
        ))
    }

    /// Looks up a short URL and applies the validity window and visit cap at `now`.
    ///
    /// Every non-resolvable case is reported as not found; the actual reason is
    /// only logged and counted.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the code is unknown or not resolvable.
    pub async fn resolve(&self, short_code: &str, now: DateTime<Utc>) -> Result<ShortUrl, AppError> {
        let Some(short_url) = self.repository.find_by_short_code(short_code).await? else {
            metrics::counter!("short_url_resolutions_total", "outcome" => "unknown").increment(1);
            tracing::debug!(short_code, "Unknown short code");
            return Err(not_found(short_code));
        };

        let resolvability = short_url.resolvability(now);
        metrics::counter!("short_url_resolutions_total", "outcome" => resolvability.as_str())
            .increment(1);

        if resolvability != Resolvability::Resolvable {
            tracing::info!(
                short_code,
                reason = resolvability.as_str(),
                "Short URL not resolvable"
            );
            return Err(not_found(short_code));
        }

        Ok(short_url)
    }

    /// Metadata lookup ignoring the validity rules.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the code is unknown.
    pub async fn get(&self, short_code: &str) -> Result<ShortUrl, AppError> {
        self.repository
            .find_by_short_code(short_code)
            .await?
            .ok_or_else(|| not_found(short_code))
    }

    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn list(&self, query: ShortUrlsListQuery) -> Result<Vec<ShortUrl>, AppError> {
        self.repository.find_list(query).await
    }

    /// Counts matches of the query's filters; pagination and ordering are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn count(&self, query: &ShortUrlsListQuery) -> Result<i64, AppError> {
        self.repository.count_list(query.for_count()).await
    }

    /// Applies a partial metadata update.
    ///
    /// The patch is merged over the stored values before validation, so a
    /// window can be moved by sending a single bound.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the code is unknown.
    /// Returns [`AppError::Validation`] if the merged metadata is invalid.
    pub async fn update_metadata(
        &self,
        short_code: &str,
        patch: ShortUrlMetaPatch,
    ) -> Result<ShortUrl, AppError> {
        let current = self.get(short_code).await?;
        if patch.is_empty() {
            return Ok(current);
        }

        let merged = patch.apply_to(current.meta());
        merged.validate()?;

        let updated = self.repository.update_meta(current.id, merged).await?;
        tracing::info!(short_code, "Short URL metadata updated");

        Ok(updated)
    }

    /// Replaces the tag set of a short URL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the code is unknown.
    pub async fn set_tags(&self, short_code: &str, tags: Vec<String>) -> Result<ShortUrl, AppError> {
        let current = self.get(short_code).await?;
        self.repository
            .set_tags(current.id, normalize_tag_names(tags))
            .await
    }

    /// Deletes a short URL together with its visits.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the code is unknown.
    pub async fn delete(&self, short_code: &str) -> Result<(), AppError> {
        if !self.repository.delete(short_code).await? {
            return Err(not_found(short_code));
        }

        tracing::info!(short_code, "Short URL deleted");
        Ok(())
    }

    /// Public URL for a short code: `{schema}://{host}/{code}`.
    pub fn short_url(&self, short_code: &str) -> String {
        format!(
            "{}://{}/{}",
            self.schema,
            self.host.trim_end_matches('/'),
            short_code
        )
    }

    /// Liveness of the backing store, for the health endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the store is unreachable.
    pub async fn ping(&self) -> Result<(), AppError> {
        self.repository.ping().await
    }
}

fn not_found(short_code: &str) -> AppError {
    AppError::not_found(
        "No URL found with this short code",
        json!({ "short_code": short_code }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockShortUrlRepository;
    use crate::infrastructure::url_validator::{MockUrlValidator, NoopUrlValidator};
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicI64, Ordering};

    fn stored(id: i64, code: &str) -> ShortUrl {
        ShortUrl {
            id,
            short_code: code.to_string(),
            original_url: "https://example.com".to_string(),
            date_created: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            valid_since: None,
            valid_until: None,
            max_visits: None,
            tags: vec![],
            visits_count: 0,
        }
    }

    fn service(repo: MockShortUrlRepository) -> ShortUrlService {
        ShortUrlService::new(
            Arc::new(repo),
            Arc::new(NoopUrlValidator),
            Alphabet::default(),
            "https",
            "s.test",
        )
    }

    fn echo_create(repo: &mut MockShortUrlRepository) {
        repo.expect_create().returning(|new| {
            let mut url = stored(new.id, &new.short_code);
            url.original_url = new.original_url;
            url.tags = new.tags;
            url.max_visits = new.meta.max_visits;
            Ok(url)
        });
    }

    #[tokio::test]
    async fn test_create_encodes_reserved_id() {
        let mut repo = MockShortUrlRepository::new();
        repo.expect_next_id().times(1).returning(|| Ok(125));
        repo.expect_short_code_exists().returning(|_| Ok(false));
        echo_create(&mut repo);

        let created = service(repo)
            .create(CreateShortUrl::new("https://example.com/page"))
            .await
            .unwrap();

        assert_eq!(created.short_code, Alphabet::default().encode(125));
        assert_eq!(created.original_url, "https://example.com/page");
    }

    #[tokio::test]
    async fn test_sequential_generations_are_distinct() {
        let seq = Arc::new(AtomicI64::new(0));
        let mut repo = MockShortUrlRepository::new();
        let s = seq.clone();
        repo.expect_next_id()
            .returning(move || Ok(s.fetch_add(1, Ordering::SeqCst) + 1));
        repo.expect_short_code_exists().returning(|_| Ok(false));
        echo_create(&mut repo);

        let svc = service(repo);
        let a = svc.create(CreateShortUrl::new("https://a.com")).await.unwrap();
        let b = svc.create(CreateShortUrl::new("https://a.com")).await.unwrap();

        assert_ne!(a.short_code, b.short_code);
    }

    #[tokio::test]
    async fn test_create_skips_codes_taken_by_slugs() {
        let alphabet = Alphabet::default();
        let taken = alphabet.encode(7);

        let mut repo = MockShortUrlRepository::new();
        let mut next = vec![8, 7];
        repo.expect_next_id()
            .times(2)
            .returning(move || Ok(next.pop().unwrap_or(99)));
        repo.expect_short_code_exists()
            .returning(move |code| Ok(code == taken));
        echo_create(&mut repo);

        let created = service(repo)
            .create(CreateShortUrl::new("https://example.com"))
            .await
            .unwrap();

        assert_eq!(created.id, 8);
        assert_eq!(created.short_code, alphabet.encode(8));
    }

    #[tokio::test]
    async fn test_create_gives_up_after_bounded_attempts() {
        let mut repo = MockShortUrlRepository::new();
        repo.expect_next_id()
            .times(MAX_GENERATION_ATTEMPTS)
            .returning(|| Ok(1));
        repo.expect_short_code_exists().returning(|_| Ok(true));
        repo.expect_create().never();

        let err = service(repo)
            .create(CreateShortUrl::new("https://example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal { .. }));
    }

    #[tokio::test]
    async fn test_taken_slug_is_conflict() {
        let mut repo = MockShortUrlRepository::new();
        repo.expect_short_code_exists()
            .withf(|code| code == "promo")
            .returning(|_| Ok(true));
        repo.expect_next_id().never();
        repo.expect_create().never();

        let mut request = CreateShortUrl::new("https://example.com");
        request.custom_slug = Some("promo".to_string());

        let err = service(repo).create(request).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_reserved_slug_is_rejected() {
        let repo = MockShortUrlRepository::new();
        let mut request = CreateShortUrl::new("https://example.com");
        request.custom_slug = Some("rest".to_string());

        let err = service(repo).create(request).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_missing_url_message() {
        let err = service(MockShortUrlRepository::new())
            .create(CreateShortUrl::new("  "))
            .await
            .unwrap_err();

        assert_eq!(err.to_error_info().message, "A URL was not provided");
    }

    #[tokio::test]
    async fn test_invalid_meta_rejected_before_storage() {
        let mut repo = MockShortUrlRepository::new();
        repo.expect_next_id().never();

        let mut request = CreateShortUrl::new("https://example.com");
        request.meta.max_visits = Some(0);

        let err = service(repo).create(request).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_url_rejected() {
        let mut validator = MockUrlValidator::new();
        validator.expect_validate().returning(|url| {
            Err(AppError::bad_request(
                "Provided URL is not reachable",
                json!({ "url": url }),
            ))
        });
        let mut repo = MockShortUrlRepository::new();
        repo.expect_next_id().never();

        let svc = ShortUrlService::new(
            Arc::new(repo),
            Arc::new(validator),
            Alphabet::default(),
            "http",
            "localhost",
        );

        let err = svc
            .create(CreateShortUrl::new("https://unreachable.test"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_resolve_applies_visit_cap() {
        let mut repo = MockShortUrlRepository::new();
        repo.expect_find_by_short_code().returning(|code| {
            let mut url = stored(1, code);
            url.max_visits = Some(2);
            url.visits_count = 2;
            Ok(Some(url))
        });

        let err = service(repo).resolve("abc", Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_resolve_window_is_inclusive() {
        let until = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut repo = MockShortUrlRepository::new();
        repo.expect_find_by_short_code().returning(move |code| {
            let mut url = stored(1, code);
            url.valid_until = Some(until);
            Ok(Some(url))
        });

        let svc = service(repo);
        assert!(svc.resolve("abc", until).await.is_ok());
        assert!(
            svc.resolve("abc", until + Duration::seconds(1))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_resolve_unknown_is_not_found() {
        let mut repo = MockShortUrlRepository::new();
        repo.expect_find_by_short_code().returning(|_| Ok(None));

        let err = service(repo).resolve("nope", Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_metadata_validates_merged_window() {
        let since = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let mut repo = MockShortUrlRepository::new();
        repo.expect_find_by_short_code().returning(move |code| {
            let mut url = stored(1, code);
            url.valid_since = Some(since);
            Ok(Some(url))
        });
        repo.expect_update_meta().never();

        let patch = ShortUrlMetaPatch {
            valid_until: Some(Some(since - Duration::days(1))),
            ..Default::default()
        };

        let err = service(repo)
            .update_metadata("abc", patch)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_update_metadata_clears_field() {
        let mut repo = MockShortUrlRepository::new();
        repo.expect_find_by_short_code().returning(|code| {
            let mut url = stored(4, code);
            url.max_visits = Some(10);
            Ok(Some(url))
        });
        repo.expect_update_meta()
            .withf(|id, meta| *id == 4 && meta.max_visits.is_none())
            .times(1)
            .returning(|id, _| Ok(stored(id, "abc")));

        let patch = ShortUrlMetaPatch {
            max_visits: Some(None),
            ..Default::default()
        };

        let updated = service(repo).update_metadata("abc", patch).await.unwrap();
        assert_eq!(updated.max_visits, None);
    }

    #[tokio::test]
    async fn test_update_metadata_unknown_is_not_found() {
        let mut repo = MockShortUrlRepository::new();
        repo.expect_find_by_short_code().returning(|_| Ok(None));

        let err = service(repo)
            .update_metadata("nope", ShortUrlMetaPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_unknown_is_not_found() {
        let mut repo = MockShortUrlRepository::new();
        repo.expect_delete().returning(|_| Ok(false));

        let err = service(repo).delete("gone").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_set_tags_normalizes_names() {
        let mut repo = MockShortUrlRepository::new();
        repo.expect_find_by_short_code()
            .returning(|code| Ok(Some(stored(3, code))));
        repo.expect_set_tags()
            .withf(|id, tags| *id == 3 && tags == &vec!["a".to_string(), "b".to_string()])
            .times(1)
            .returning(|id, tags| {
                let mut url = stored(id, "abc");
                url.tags = tags;
                Ok(url)
            });

        let updated = service(repo)
            .set_tags(
                "abc",
                vec![" a ".to_string(), "b".to_string(), "a".to_string(), "".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(updated.tags, vec!["a", "b"]);
    }

    #[test]
    fn test_short_url_format() {
        let svc = ShortUrlService::new(
            Arc::new(MockShortUrlRepository::new()),
            Arc::new(NoopUrlValidator),
            Alphabet::default(),
            "https",
            "s.test/",
        );

        assert_eq!(svc.short_url("abc"), "https://s.test/abc");
    }
}
