//! Data Transfer Objects for API requests and responses.
//!
//! All DTOs use Serde for JSON and query string (de)serialization; request
//! bodies additionally derive `validator::Validate`.

pub mod api_keys;
pub mod health;
pub mod pagination;
pub mod short_urls;
pub mod tags;
pub mod visits;
