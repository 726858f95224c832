use axum::extract::{Path, State};
use axum::Extension;
use serde_json::{json, Value};

use crate::access::filter_page_by_role;
use crate::database::models::PageKind;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::state::AppState;

/// GET /api/v4/marketing/:page_id - Role-filtered marketing page
///
/// Runs behind `optional_auth`: anonymous visitors get the public rendition,
/// authenticated users get sections unlocked per their store-loaded role.
/// Unknown and unpublished pages are both a plain 404.
pub async fn marketing_get(
    State(state): State<AppState>,
    current: Option<Extension<CurrentUser>>,
    Path(page_id): Path<String>,
) -> ApiResult<Value> {
    let page = state
        .stores
        .pages
        .find(&page_id, PageKind::Marketing)
        .await?
        .filter(|page| page.published)
        .ok_or_else(|| ApiError::not_found(format!("Page '{}' not found", page_id)))?;

    let role = current.map(|Extension(user)| user.role());
    Ok(ApiResponse::success(json!({
        "page_id": page.page_id,
        "kind": page.kind,
        "content": filter_page_by_role(&page.content, role),
        "updated_at": page.updated_at,
    })))
}
