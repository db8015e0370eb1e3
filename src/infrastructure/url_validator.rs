//! Reachability check for long URLs (`VALIDATE_URL`).

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use crate::error::AppError;

/// Decides whether a syntactically valid long URL may be shortened.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlValidator: Send + Sync {
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the URL is rejected.
    async fn validate(&self, url: &str) -> Result<(), AppError>;
}

/// Accepts every URL. Used when `VALIDATE_URL` is off.
pub struct NoopUrlValidator;

#[async_trait]
impl UrlValidator for NoopUrlValidator {
    async fn validate(&self, _url: &str) -> Result<(), AppError> {
        Ok(())
    }
}

/// Requires the URL to answer a GET with a 2xx status after redirects.
pub struct HttpUrlValidator {
    client: Client,
}

impl HttpUrlValidator {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl UrlValidator for HttpUrlValidator {
    async fn validate(&self, url: &str) -> Result<(), AppError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::debug!(url, error = %e, "Long URL is unreachable");
            AppError::bad_request(
                "Provided URL is not reachable",
                json!({ "url": url, "reason": e.to_string() }),
            )
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::bad_request(
                "Provided URL is not reachable",
                json!({ "url": url, "status": status.as_u16() }),
            ));
        }

        Ok(())
    }
}
