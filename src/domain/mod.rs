//! Domain layer: entities, listing plan, repository contracts and the location worker.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`list_query`] - Short URL listing plan
//! - [`repositories`] - Data access trait definitions
//! - [`location_event`] - Location request model
//! - [`location_worker`] - Background location resolution
//!
//! # Visit Flow
//!
//! 1. The redirect handler records the visit synchronously
//! 2. A [`location_event::LocateVisit`] is pushed to a bounded channel (dropped when full)
//! 3. [`location_worker::run_location_worker`] resolves the address out of band
//! 4. Visits left pending are swept by the `visit process` CLI command

pub mod entities;
pub mod list_query;
pub mod location_event;
pub mod location_worker;
pub mod repositories;
