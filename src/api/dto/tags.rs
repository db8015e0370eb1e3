//! DTOs for tag endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::TagInfo;

#[derive(Debug, Serialize)]
pub struct TagResponse {
    pub name: String,
    pub short_urls_count: i64,
}

impl From<TagInfo> for TagResponse {
    fn from(tag: TagInfo) -> Self {
        Self {
            name: tag.name,
            short_urls_count: tag.short_urls_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TagsListResponse {
    pub data: Vec<TagResponse>,
}

/// Body of `POST /rest/tags`.
#[derive(Debug, Deserialize)]
pub struct CreateTagsRequest {
    pub tags: Vec<String>,
}

/// Body of `PUT /rest/tags`.
#[derive(Debug, Deserialize, Validate)]
pub struct RenameTagRequest {
    #[validate(length(min = 1, message = "old_name is required"))]
    pub old_name: String,

    #[validate(length(min = 1, message = "new_name is required"))]
    pub new_name: String,
}

/// Query of `DELETE /rest/tags`: comma-separated names.
#[derive(Debug, Deserialize)]
pub struct DeleteTagsParams {
    pub tags: Option<String>,
}

/// Number of tags affected by a bulk operation.
#[derive(Debug, Serialize)]
pub struct TagsAffectedResponse {
    pub affected: u64,
}
