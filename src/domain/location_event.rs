//! Location request passed from the redirect path to the location worker.

/// A freshly recorded visit waiting for geolocation.
///
/// Sent through a bounded channel right after the visit row is written, so the
/// redirect response never waits on the IP-location provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocateVisit {
    pub visit_id: i64,
    pub remote_addr: Option<String>,
}

impl LocateVisit {
    pub fn new(visit_id: i64, remote_addr: Option<String>) -> Self {
        Self {
            visit_id,
            remote_addr,
        }
    }
}
