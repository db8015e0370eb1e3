//! In-memory arena implementing every repository trait.
//!
//! Backs `STORAGE=memory` and the integration tests. Records live in ordered maps
//! keyed by id and refer to each other by id only, mirroring the relational schema.
//! Semantics follow the PostgreSQL repositories, including the listing plan.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::Mutex;

use crate::domain::entities::{
    ApiKey, NewApiKey, NewShortUrl, NewVisit, ShortUrl, ShortUrlMeta, TagInfo, Visit,
    VisitLocation,
};
use crate::domain::list_query::ShortUrlsListQuery;
use crate::domain::repositories::{
    ApiKeyRepository, ShortUrlRepository, TagRepository, VisitRepository, VisitsFilter,
};
use crate::error::AppError;

#[derive(Debug, Clone)]
struct ShortUrlRecord {
    id: i64,
    short_code: String,
    original_url: String,
    date_created: chrono::DateTime<Utc>,
    meta: ShortUrlMeta,
    tags: BTreeSet<String>,
}

#[derive(Debug, Default)]
struct Arena {
    short_url_seq: i64,
    visit_seq: i64,
    api_key_seq: i64,
    short_urls: BTreeMap<i64, ShortUrlRecord>,
    tags: BTreeSet<String>,
    visits: BTreeMap<i64, Visit>,
    api_keys: BTreeMap<i64, ApiKey>,
}

impl Arena {
    fn load(&self, record: &ShortUrlRecord) -> ShortUrl {
        let visits_count = self
            .visits
            .values()
            .filter(|v| v.short_url_id == record.id)
            .count() as i64;

        ShortUrl {
            id: record.id,
            short_code: record.short_code.clone(),
            original_url: record.original_url.clone(),
            date_created: record.date_created,
            valid_since: record.meta.valid_since,
            valid_until: record.meta.valid_until,
            max_visits: record.meta.max_visits,
            tags: record.tags.iter().cloned().collect(),
            visits_count,
        }
    }

    fn load_id(&self, id: i64) -> Result<ShortUrl, AppError> {
        self.short_urls
            .get(&id)
            .map(|r| self.load(r))
            .ok_or_else(|| AppError::not_found("Short URL not found", json!({ "id": id })))
    }

    fn matching(&self, query: &ShortUrlsListQuery) -> Vec<ShortUrl> {
        self.short_urls
            .values()
            .map(|r| self.load(r))
            .filter(|s| query.matches(s))
            .collect()
    }

    fn visits_for(&self, short_url_id: i64, filter: &VisitsFilter) -> Vec<&Visit> {
        self.visits
            .values()
            .filter(|v| v.short_url_id == short_url_id && filter.includes(v.date))
            .collect()
    }
}

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    arena: Mutex<Arena>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShortUrlRepository for InMemoryStore {
    async fn next_id(&self) -> Result<i64, AppError> {
        let mut arena = self.arena.lock().await;
        arena.short_url_seq += 1;
        Ok(arena.short_url_seq)
    }

    async fn create(&self, new_short_url: NewShortUrl) -> Result<ShortUrl, AppError> {
        let mut arena = self.arena.lock().await;

        if arena
            .short_urls
            .values()
            .any(|r| r.short_code == new_short_url.short_code)
        {
            return Err(AppError::conflict(
                "Short code already in use",
                json!({ "short_code": new_short_url.short_code }),
            ));
        }

        if arena.short_urls.contains_key(&new_short_url.id) {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "id": new_short_url.id }),
            ));
        }

        let tags: BTreeSet<String> = new_short_url.tags.into_iter().collect();
        arena.tags.extend(tags.iter().cloned());

        let record = ShortUrlRecord {
            id: new_short_url.id,
            short_code: new_short_url.short_code,
            original_url: new_short_url.original_url,
            date_created: Utc::now(),
            meta: new_short_url.meta,
            tags,
        };
        arena.short_urls.insert(record.id, record);

        arena.load_id(new_short_url.id)
    }

    async fn find_by_short_code(&self, short_code: &str) -> Result<Option<ShortUrl>, AppError> {
        let arena = self.arena.lock().await;

        Ok(arena
            .short_urls
            .values()
            .find(|r| r.short_code == short_code)
            .map(|r| arena.load(r)))
    }

    async fn short_code_exists(&self, short_code: &str) -> Result<bool, AppError> {
        let arena = self.arena.lock().await;
        Ok(arena.short_urls.values().any(|r| r.short_code == short_code))
    }

    async fn find_list(&self, query: ShortUrlsListQuery) -> Result<Vec<ShortUrl>, AppError> {
        let arena = self.arena.lock().await;
        let mut rows = arena.matching(&query);

        if query.order_by.effective().is_some() {
            rows.sort_by(|a, b| {
                query
                    .order_by
                    .compare(a, b)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        let offset = query.offset.unwrap_or(0).max(0) as usize;
        let limit = query.limit.map_or(usize::MAX, |l| l.max(0) as usize);

        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_list(&self, query: ShortUrlsListQuery) -> Result<i64, AppError> {
        let arena = self.arena.lock().await;
        Ok(arena.matching(&query).len() as i64)
    }

    async fn update_meta(&self, id: i64, meta: ShortUrlMeta) -> Result<ShortUrl, AppError> {
        let mut arena = self.arena.lock().await;

        let record = arena
            .short_urls
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Short URL not found", json!({ "id": id })))?;
        record.meta = meta;

        arena.load_id(id)
    }

    async fn set_tags(&self, id: i64, tags: Vec<String>) -> Result<ShortUrl, AppError> {
        let mut arena = self.arena.lock().await;

        let tags: BTreeSet<String> = tags.into_iter().collect();
        let record = arena
            .short_urls
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Short URL not found", json!({ "id": id })))?;
        record.tags = tags.clone();
        arena.tags.extend(tags);

        arena.load_id(id)
    }

    async fn delete(&self, short_code: &str) -> Result<bool, AppError> {
        let mut arena = self.arena.lock().await;

        let Some(id) = arena
            .short_urls
            .values()
            .find(|r| r.short_code == short_code)
            .map(|r| r.id)
        else {
            return Ok(false);
        };

        arena.short_urls.remove(&id);
        arena.visits.retain(|_, v| v.short_url_id != id);

        Ok(true)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[async_trait]
impl VisitRepository for InMemoryStore {
    async fn create(&self, new_visit: NewVisit) -> Result<Visit, AppError> {
        let mut arena = self.arena.lock().await;

        if !arena.short_urls.contains_key(&new_visit.short_url_id) {
            return Err(AppError::internal(
                "Visit references an unknown short URL",
                json!({ "short_url_id": new_visit.short_url_id }),
            ));
        }

        arena.visit_seq += 1;
        let visit = Visit {
            id: arena.visit_seq,
            short_url_id: new_visit.short_url_id,
            date: new_visit.date,
            remote_addr: new_visit.remote_addr,
            user_agent: new_visit.user_agent,
            referer: new_visit.referer,
            location: None,
            location_skipped: false,
        };
        arena.visits.insert(visit.id, visit.clone());

        Ok(visit)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Visit>, AppError> {
        let arena = self.arena.lock().await;
        Ok(arena.visits.get(&id).cloned())
    }

    async fn find_pending_location(
        &self,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<Visit>, AppError> {
        let arena = self.arena.lock().await;

        Ok(arena
            .visits
            .range(after_id + 1..)
            .map(|(_, v)| v)
            .filter(|v| v.is_pending_location())
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn save_location(
        &self,
        visit_id: i64,
        location: VisitLocation,
    ) -> Result<bool, AppError> {
        let mut arena = self.arena.lock().await;

        match arena.visits.get_mut(&visit_id) {
            Some(visit) if visit.location.is_none() => {
                visit.location = Some(location);
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(AppError::internal(
                "Location references an unknown visit",
                json!({ "visit_id": visit_id }),
            )),
        }
    }

    async fn mark_location_skipped(&self, visit_id: i64) -> Result<(), AppError> {
        let mut arena = self.arena.lock().await;

        if let Some(visit) = arena.visits.get_mut(&visit_id) {
            visit.location_skipped = true;
        }

        Ok(())
    }

    async fn list_for_short_url(
        &self,
        short_url_id: i64,
        filter: VisitsFilter,
    ) -> Result<Vec<Visit>, AppError> {
        let arena = self.arena.lock().await;

        let mut visits = arena.visits_for(short_url_id, &filter);
        visits.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));

        Ok(visits
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count_for_short_url(
        &self,
        short_url_id: i64,
        filter: VisitsFilter,
    ) -> Result<i64, AppError> {
        let arena = self.arena.lock().await;
        Ok(arena.visits_for(short_url_id, &filter).len() as i64)
    }
}

#[async_trait]
impl TagRepository for InMemoryStore {
    async fn list(&self) -> Result<Vec<TagInfo>, AppError> {
        let arena = self.arena.lock().await;

        Ok(arena
            .tags
            .iter()
            .map(|name| TagInfo {
                name: name.clone(),
                short_urls_count: arena
                    .short_urls
                    .values()
                    .filter(|r| r.tags.contains(name))
                    .count() as i64,
            })
            .collect())
    }

    async fn create(&self, names: Vec<String>) -> Result<u64, AppError> {
        let mut arena = self.arena.lock().await;

        let created = names
            .into_iter()
            .filter(|name| arena.tags.insert(name.clone()))
            .count();

        Ok(created as u64)
    }

    async fn exists(&self, name: &str) -> Result<bool, AppError> {
        let arena = self.arena.lock().await;
        Ok(arena.tags.contains(name))
    }

    async fn rename(&self, old_name: &str, new_name: &str) -> Result<bool, AppError> {
        let mut arena = self.arena.lock().await;

        if !arena.tags.contains(old_name) {
            return Ok(false);
        }
        if old_name == new_name {
            return Ok(true);
        }
        if arena.tags.contains(new_name) {
            return Err(AppError::conflict(
                "A tag with this name already exists",
                json!({ "name": new_name }),
            ));
        }

        arena.tags.remove(old_name);
        arena.tags.insert(new_name.to_string());
        for record in arena.short_urls.values_mut() {
            if record.tags.remove(old_name) {
                record.tags.insert(new_name.to_string());
            }
        }

        Ok(true)
    }

    async fn delete(&self, names: Vec<String>) -> Result<u64, AppError> {
        let mut arena = self.arena.lock().await;

        let mut deleted = 0;
        for name in &names {
            if arena.tags.remove(name) {
                deleted += 1;
                for record in arena.short_urls.values_mut() {
                    record.tags.remove(name);
                }
            }
        }

        Ok(deleted)
    }

    async fn delete_orphans(&self) -> Result<u64, AppError> {
        let mut arena = self.arena.lock().await;

        let used: BTreeSet<String> = arena
            .short_urls
            .values()
            .flat_map(|r| r.tags.iter().cloned())
            .collect();

        let before = arena.tags.len();
        arena.tags.retain(|t| used.contains(t));

        Ok((before - arena.tags.len()) as u64)
    }
}

#[async_trait]
impl ApiKeyRepository for InMemoryStore {
    async fn create(&self, new_key: NewApiKey) -> Result<ApiKey, AppError> {
        let mut arena = self.arena.lock().await;

        if arena
            .api_keys
            .values()
            .any(|k| k.key_hash == new_key.key_hash)
        {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "api_keys_key_hash_key" }),
            ));
        }

        arena.api_key_seq += 1;
        let key = ApiKey {
            id: arena.api_key_seq,
            key_hash: new_key.key_hash,
            key_prefix: new_key.key_prefix,
            expiration_date: new_key.expiration_date,
            enabled: true,
            date_created: Utc::now(),
        };
        arena.api_keys.insert(key.id, key.clone());

        Ok(key)
    }

    async fn find_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, AppError> {
        let arena = self.arena.lock().await;
        Ok(arena
            .api_keys
            .values()
            .find(|k| k.key_hash == key_hash)
            .cloned())
    }

    async fn list(&self, enabled_only: bool) -> Result<Vec<ApiKey>, AppError> {
        let arena = self.arena.lock().await;

        Ok(arena
            .api_keys
            .values()
            .rev()
            .filter(|k| !enabled_only || k.enabled)
            .cloned()
            .collect())
    }

    async fn disable(&self, id: i64) -> Result<(), AppError> {
        let mut arena = self.arena.lock().await;

        let key = arena
            .api_keys
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("API key not found", json!({ "id": id })))?;
        key.enabled = false;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::list_query::{Direction, OrderBy, OrderField};

    async fn add(store: &InMemoryStore, code: &str, url: &str, tags: &[&str]) -> ShortUrl {
        let id = ShortUrlRepository::next_id(store).await.unwrap();
        ShortUrlRepository::create(
            store,
            NewShortUrl {
                id,
                short_code: code.to_string(),
                original_url: url.to_string(),
                meta: ShortUrlMeta::default(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
            },
        )
        .await
        .unwrap()
    }

    async fn visit(store: &InMemoryStore, short_url_id: i64) -> Visit {
        VisitRepository::create(
            store,
            NewVisit {
                short_url_id,
                date: Utc::now(),
                remote_addr: Some("8.8.8.8".to_string()),
                user_agent: None,
                referer: None,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_short_code_conflicts() {
        let store = InMemoryStore::new();
        add(&store, "abc", "https://a.com", &[]).await;

        let id = ShortUrlRepository::next_id(&store).await.unwrap();
        let result = ShortUrlRepository::create(
            &store,
            NewShortUrl {
                id,
                short_code: "abc".to_string(),
                original_url: "https://b.com".to_string(),
                meta: ShortUrlMeta::default(),
                tags: vec![],
            },
        )
        .await;

        assert!(matches!(result, Err(AppError::Conflict { .. })));
        let kept = store.find_by_short_code("abc").await.unwrap().unwrap();
        assert_eq!(kept.original_url, "https://a.com");
    }

    #[tokio::test]
    async fn test_find_is_case_sensitive() {
        let store = InMemoryStore::new();
        add(&store, "AbC", "https://a.com", &[]).await;

        assert!(store.find_by_short_code("abc").await.unwrap().is_none());
        assert!(store.find_by_short_code("AbC").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_orders_by_visits_and_paginates() {
        let store = InMemoryStore::new();
        add(&store, "a", "https://a.com", &[]).await;
        let b = add(&store, "b", "https://b.com", &[]).await;
        let c = add(&store, "c", "https://c.com", &[]).await;

        for _ in 0..3 {
            visit(&store, b.id).await;
        }
        visit(&store, c.id).await;

        let query = ShortUrlsListQuery::new()
            .order_by(OrderBy::Field(OrderField::Visits, Direction::Desc));
        let codes: Vec<String> = store
            .find_list(query.clone())
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.short_code)
            .collect();
        assert_eq!(codes, vec!["b", "c", "a"]);

        let page = store.find_list(query.paginate(1, 1)).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].short_code, "c");
        assert_eq!(page[0].visits_count, 1);

        assert_eq!(
            store.count_list(ShortUrlsListQuery::new()).await.unwrap(),
            3
        );
    }

    #[tokio::test]
    async fn test_delete_removes_visits() {
        let store = InMemoryStore::new();
        let s = add(&store, "gone", "https://a.com", &[]).await;
        let v = visit(&store, s.id).await;

        assert!(ShortUrlRepository::delete(&store, "gone").await.unwrap());
        assert!(!ShortUrlRepository::delete(&store, "gone").await.unwrap());
        assert!(VisitRepository::find_by_id(&store, v.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_location_is_idempotent() {
        let store = InMemoryStore::new();
        let s = add(&store, "loc", "https://a.com", &[]).await;
        let v = visit(&store, s.id).await;

        let first = VisitLocation {
            country_code: Some("US".to_string()),
            ..Default::default()
        };
        let second = VisitLocation {
            country_code: Some("FR".to_string()),
            ..Default::default()
        };

        assert!(store.save_location(v.id, first).await.unwrap());
        assert!(!store.save_location(v.id, second).await.unwrap());

        let stored = VisitRepository::find_by_id(&store, v.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            stored.location.unwrap().country_code.as_deref(),
            Some("US")
        );
        assert!(store.find_pending_location(0, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tag_rename_and_prune() {
        let store = InMemoryStore::new();
        add(&store, "t1", "https://a.com", &["old"]).await;
        TagRepository::create(&store, vec!["orphan".to_string()])
            .await
            .unwrap();

        assert!(store.rename("old", "new").await.unwrap());
        assert!(!store.rename("missing", "x").await.unwrap());

        let s = store.find_by_short_code("t1").await.unwrap().unwrap();
        assert_eq!(s.tags, vec!["new"]);

        assert_eq!(store.delete_orphans().await.unwrap(), 1);
        let names: Vec<String> = TagRepository::list(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["new"]);
    }
}
