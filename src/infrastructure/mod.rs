//! Infrastructure layer for external integrations.
//!
//! Implements the interfaces defined by the domain layer.
//!
//! # Modules
//!
//! - [`cache`] - IP location cache (Redis and no-op)
//! - [`geolocation`] - IP location provider client
//! - [`persistence`] - PostgreSQL and in-memory repositories
//! - [`url_validator`] - Long URL reachability check

pub mod cache;
pub mod geolocation;
pub mod persistence;
pub mod url_validator;
