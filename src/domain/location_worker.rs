//! Background task resolving visit locations.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::services::{LocateOutcome, VisitLocator};
use crate::domain::location_event::LocateVisit;

/// Consumes [`LocateVisit`] events until every sender is dropped.
///
/// Failures never stop the loop: the locator logs them, and a visit left
/// pending is picked up again by `shortlink-cli visit process`.
pub async fn run_location_worker(mut rx: mpsc::Receiver<LocateVisit>, locator: Arc<VisitLocator>) {
    while let Some(event) = rx.recv().await {
        match locator.locate(event.visit_id, event.remote_addr.as_deref()).await {
            Ok(LocateOutcome::Located) => {
                tracing::debug!(visit_id = event.visit_id, "Visit located");
            }
            Ok(outcome) => {
                tracing::debug!(visit_id = event.visit_id, outcome = ?outcome, "Visit not located");
            }
            Err(e) => {
                tracing::error!(visit_id = event.visit_id, error = %e, "Failed to locate visit");
            }
        }
    }

    tracing::info!("Location worker stopped");
}
