//! Repository trait definitions for the domain layer.
//!
//! Traits define the data-access contract; implementations live in
//! `crate::infrastructure::persistence` (PostgreSQL and in-memory). Mock
//! implementations are generated via `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`ShortUrlRepository`] - Short URL CRUD and listing
//! - [`VisitRepository`] - Visit tracking and location storage
//! - [`TagRepository`] - Tag management
//! - [`ApiKeyRepository`] - API key storage

pub mod api_key_repository;
pub mod short_url_repository;
pub mod tag_repository;
pub mod visit_repository;

pub use api_key_repository::ApiKeyRepository;
pub use short_url_repository::ShortUrlRepository;
pub use tag_repository::TagRepository;
pub use visit_repository::{VisitRepository, VisitsFilter};

#[cfg(test)]
pub use api_key_repository::MockApiKeyRepository;
#[cfg(test)]
pub use short_url_repository::MockShortUrlRepository;
#[cfg(test)]
pub use tag_repository::MockTagRepository;
#[cfg(test)]
pub use visit_repository::MockVisitRepository;
