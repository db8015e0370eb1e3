//! Business logic services for the application layer.

pub mod api_key_service;
pub mod short_url_service;
pub mod tag_service;
pub mod visit_locator;
pub mod visit_service;

pub use api_key_service::ApiKeyService;
pub use short_url_service::{CreateShortUrl, ShortUrlService};
pub use tag_service::TagService;
pub use visit_locator::{LocateOutcome, LocateSummary, RetryPolicy, VisitLocator};
pub use visit_service::{VisitContext, VisitService, VisitsPage};
