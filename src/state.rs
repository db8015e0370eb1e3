//! Shared application state injected into every handler.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::services::{ApiKeyService, ShortUrlService, TagService, VisitService};
use crate::config::Config;
use crate::domain::location_event::LocateVisit;
use crate::infrastructure::cache::LocationCache;
use crate::infrastructure::persistence::Repositories;
use crate::infrastructure::url_validator::UrlValidator;
use crate::utils::code_generator::Alphabet;

/// Settings the services need from [`Config`].
#[derive(Debug, Clone)]
pub struct StateOptions {
    pub alphabet: Alphabet,
    pub short_domain_schema: String,
    pub short_domain_host: String,
    pub token_signing_secret: String,
    pub behind_proxy: bool,
}

impl StateOptions {
    /// # Errors
    ///
    /// Returns an error if the configured alphabet is invalid.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            alphabet: config.alphabet()?,
            short_domain_schema: config.short_domain_schema.clone(),
            short_domain_host: config.short_domain_host.clone(),
            token_signing_secret: config.token_signing_secret.clone(),
            behind_proxy: config.behind_proxy,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub short_url_service: Arc<ShortUrlService>,
    pub visit_service: Arc<VisitService>,
    pub api_key_service: Arc<ApiKeyService>,
    pub tag_service: Arc<TagService>,
    pub location_cache: Arc<dyn LocationCache>,
    /// Feeds the location worker. Full queue means the visit stays pending.
    pub locate_sender: mpsc::Sender<LocateVisit>,
    pub behind_proxy: bool,
}

impl AppState {
    /// Wires every service over one set of repositories.
    pub fn new(
        repositories: &Repositories,
        options: StateOptions,
        url_validator: Arc<dyn UrlValidator>,
        location_cache: Arc<dyn LocationCache>,
        locate_sender: mpsc::Sender<LocateVisit>,
    ) -> Self {
        let short_url_service = ShortUrlService::new(
            repositories.short_urls.clone(),
            url_validator,
            options.alphabet,
            options.short_domain_schema,
            options.short_domain_host,
        );
        let visit_service =
            VisitService::new(repositories.short_urls.clone(), repositories.visits.clone());
        let api_key_service =
            ApiKeyService::new(repositories.api_keys.clone(), options.token_signing_secret);
        let tag_service = TagService::new(repositories.tags.clone());

        Self {
            short_url_service: Arc::new(short_url_service),
            visit_service: Arc::new(visit_service),
            api_key_service: Arc::new(api_key_service),
            tag_service: Arc::new(tag_service),
            location_cache,
            locate_sender,
            behind_proxy: options.behind_proxy,
        }
    }
}
