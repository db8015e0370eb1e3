//! IP-to-location resolution through an external provider.
//!
//! - [`IpLocationResolver`] - provider abstraction
//! - [`IpApiLocationResolver`] - ip-api.com client

mod ip_api;

pub use ip_api::IpApiLocationResolver;

use async_trait::async_trait;
use std::net::IpAddr;

use crate::domain::entities::VisitLocation;

/// Provider failure classes.
///
/// Transient failures are retried; permanent ones mark the visit as skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    /// Network error, rate limit or provider outage.
    #[error("Transient location failure: {0}")]
    Transient(String),

    /// The provider cannot locate this address, now or later.
    #[error("Permanent location failure: {0}")]
    Permanent(String),
}

impl LocationError {
    pub fn is_transient(&self) -> bool {
        matches!(self, LocationError::Transient(_))
    }
}

/// Resolves a public IP address to a location.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IpLocationResolver: Send + Sync {
    /// # Errors
    ///
    /// See [`LocationError`].
    async fn resolve(&self, ip: IpAddr) -> Result<VisitLocation, LocationError>;
}

/// Returns true for addresses no public provider can locate.
///
/// Covers loopback, private, link-local, unspecified, broadcast, documentation
/// and shared (CGNAT) ranges, plus IPv6 unique-local and link-local.
pub fn is_locatable(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            let shared = a == 100 && (64..128).contains(&b);

            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation()
                || v4.is_multicast()
                || shared)
        }
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_locatable(&IpAddr::V4(mapped));
            }

            let first = v6.segments()[0];
            let unique_local = (first & 0xfe00) == 0xfc00;
            let link_local = (first & 0xffc0) == 0xfe80;
            let documentation = first == 0x2001 && v6.segments()[1] == 0x0db8;

            !(v6.is_loopback()
                || v6.is_unspecified()
                || v6.is_multicast()
                || unique_local
                || link_local
                || documentation)
        }
    }
}
