//! Core domain entities.
//!
//! Entities are plain data. Relationships are carried as foreign-key ids and
//! loaded by explicit repository queries.
//!
//! # Entity Types
//!
//! - [`ShortUrl`] - A shortened URL mapping with validity window and visit cap
//! - [`Visit`] - A redirect event, optionally located
//! - [`TagInfo`] - A tag with its usage count
//! - [`ApiKey`] - A hashed API key
//!
//! Creation inputs use separate `New*` structs; partial updates use
//! [`ShortUrlMetaPatch`].

pub mod api_key;
pub mod short_url;
pub mod tag;
pub mod visit;

pub use api_key::{ApiKey, NewApiKey};
pub use short_url::{NewShortUrl, Resolvability, ShortUrl, ShortUrlMeta, ShortUrlMetaPatch};
pub use tag::{TagInfo, normalize_tag_names};
pub use visit::{NewVisit, Visit, VisitLocation};
