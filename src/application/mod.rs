//! Application layer services implementing business logic.
//!
//! Services coordinate repository calls, validation and lifecycle rules and
//! expose the operations used by both the HTTP handlers and the CLI.
//!
//! # Available Services
//!
//! - [`services::ShortUrlService`] - Short URL generation, resolution and metadata
//! - [`services::VisitService`] - Visit recording and listings
//! - [`services::VisitLocator`] - Asynchronous visit geolocation
//! - [`services::ApiKeyService`] - API key issuing and authentication
//! - [`services::TagService`] - Tag management

pub mod services;
