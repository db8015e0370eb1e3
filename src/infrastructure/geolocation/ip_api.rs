//! ip-api.com client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;

use super::{IpLocationResolver, LocationError};
use crate::domain::entities::VisitLocation;

const FIELDS: &str = "status,message,countryCode,country,regionName,city,lat,lon,timezone";

/// Response body of `GET /json/{ip}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    country_code: Option<String>,
    country: Option<String>,
    region_name: Option<String>,
    city: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    timezone: Option<String>,
}

impl IpApiResponse {
    fn into_location(self) -> Result<VisitLocation, LocationError> {
        if self.status != "success" {
            return Err(LocationError::Permanent(
                self.message.unwrap_or_else(|| self.status.clone()),
            ));
        }

        let non_empty = |s: Option<String>| s.filter(|v| !v.is_empty());

        Ok(VisitLocation {
            country_code: non_empty(self.country_code),
            country_name: non_empty(self.country),
            region_name: non_empty(self.region_name),
            city_name: non_empty(self.city),
            latitude: self.lat,
            longitude: self.lon,
            timezone: non_empty(self.timezone),
        })
    }
}

/// Resolves locations with the ip-api.com JSON API.
///
/// HTTP 429 and 5xx answers and transport errors are transient; a
/// `"status": "fail"` body is permanent for that address.
pub struct IpApiLocationResolver {
    base_url: String,
    client: Client,
}

impl IpApiLocationResolver {
    /// Creates a resolver for `base_url` (e.g. `http://ip-api.com`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;

        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn endpoint(&self, ip: IpAddr) -> String {
        format!("{}/json/{}", self.base_url, ip)
    }
}

#[async_trait]
impl IpLocationResolver for IpApiLocationResolver {
    async fn resolve(&self, ip: IpAddr) -> Result<VisitLocation, LocationError> {
        let response = self
            .client
            .get(self.endpoint(ip))
            .query(&[("fields", FIELDS)])
            .send()
            .await
            .map_err(|e| LocationError::Transient(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(LocationError::Transient(format!("provider answered {status}")));
        }
        if !status.is_success() {
            return Err(LocationError::Permanent(format!("provider answered {status}")));
        }

        let body: IpApiResponse = response
            .json()
            .await
            .map_err(|e| LocationError::Transient(format!("undecodable response: {e}")))?;

        body.into_location()
    }
}
