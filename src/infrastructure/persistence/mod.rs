//! Repository implementations.
//!
//! PostgreSQL repositories issue runtime-checked SQL through SQLx; the listing
//! statement is assembled by [`list_query_sql`]. [`InMemoryStore`] implements
//! the same traits for `STORAGE=memory` and tests.
//!
//! # Repositories
//!
//! - [`PgShortUrlRepository`] - Short URLs, tag assignment, listing
//! - [`PgVisitRepository`] - Visits and visit locations
//! - [`PgTagRepository`] - Tag management
//! - [`PgApiKeyRepository`] - API key storage

pub mod list_query_sql;
pub mod memory;
pub mod pg_api_key_repository;
pub mod pg_short_url_repository;
pub mod pg_tag_repository;
pub mod pg_visit_repository;

pub use memory::InMemoryStore;
pub use pg_api_key_repository::PgApiKeyRepository;
pub use pg_short_url_repository::PgShortUrlRepository;
pub use pg_tag_repository::PgTagRepository;
pub use pg_visit_repository::PgVisitRepository;

use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::repositories::{
    ApiKeyRepository, ShortUrlRepository, TagRepository, VisitRepository,
};

/// One handle per repository trait, all backed by the same store.
#[derive(Clone)]
pub struct Repositories {
    pub short_urls: Arc<dyn ShortUrlRepository>,
    pub visits: Arc<dyn VisitRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub api_keys: Arc<dyn ApiKeyRepository>,
}

impl Repositories {
    pub fn postgres(pool: Arc<PgPool>) -> Self {
        Self {
            short_urls: Arc::new(PgShortUrlRepository::new(pool.clone())),
            visits: Arc::new(PgVisitRepository::new(pool.clone())),
            tags: Arc::new(PgTagRepository::new(pool.clone())),
            api_keys: Arc::new(PgApiKeyRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());

        Self {
            short_urls: store.clone(),
            visits: store.clone(),
            tags: store.clone(),
            api_keys: store,
        }
    }
}
