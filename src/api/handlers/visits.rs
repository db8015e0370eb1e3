//! Handler for visit listings.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_json::json;

use crate::api::dto::pagination::PaginationMeta;
use crate::api::dto::visits::{VisitsListResponse, VisitsParams};
use crate::domain::repositories::VisitsFilter;
use crate::error::AppError;
use crate::state::AppState;

/// Lists visits of one short URL, newest first.
///
/// # Endpoint
///
/// `GET /rest/short-urls/{short_code}/visits`
///
/// # Query Parameters
///
/// - `page`, `items_per_page`: pagination
/// - `start_date`, `end_date`: inclusive RFC 3339 bounds
///
/// # Errors
///
/// Returns 400 Bad Request on invalid pagination or an inverted range.
/// Returns 404 Not Found if the code is unknown.
pub async fn visits_handler(
    State(state): State<AppState>,
    Path(short_code): Path<String>,
    Query(params): Query<VisitsParams>,
) -> Result<Json<VisitsListResponse>, AppError> {
    let (offset, limit) = params
        .pagination
        .validate_and_get_offset_limit()
        .map_err(|e| AppError::bad_request(e, json!({})))?;

    let filter = VisitsFilter::new(offset, limit)
        .with_date_range(params.date_range.start_date, params.date_range.end_date);

    let page = state.visit_service.visits_for(&short_code, filter).await?;

    let pagination = PaginationMeta::new(&params.pagination, page.visits.len(), page.total);
    Ok(Json(VisitsListResponse {
        data: page.visits.into_iter().map(Into::into).collect(),
        pagination,
    }))
}
