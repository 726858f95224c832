use axum::extract::{Path, State};
use axum::Extension;
use serde_json::{json, Value};

use crate::access::filter_page_by_role;
use crate::database::models::PageKind;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::state::AppState;

/// GET /api/v4/dashboard-pages/:page_id - Role-filtered dashboard page
///
/// Dashboard pages do not have a publish gate; visibility is entirely the
/// section-level access rules applied against the store-loaded role.
pub async fn dashboard_get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(page_id): Path<String>,
) -> ApiResult<Value> {
    let page = state
        .stores
        .pages
        .find(&page_id, PageKind::Dashboard)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Page '{}' not found", page_id)))?;

    Ok(ApiResponse::success(json!({
        "page_id": page.page_id,
        "kind": page.kind,
        "content": filter_page_by_role(&page.content, Some(current.role())),
        "updated_at": page.updated_at,
    })))
}
