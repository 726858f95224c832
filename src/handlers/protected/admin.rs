use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::access::Role;
use crate::database::models::{UserHistory, EVENT_ROLE_CHANGE};
use crate::error::ApiError;
use crate::middleware::{invalidate_user_cache, ApiResponse, ApiResult, CurrentUser};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

/// GET /api/v1/admin/users - Paginated user listing, newest first
pub async fn users_list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Value> {
    require_admin(&current)?;

    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);

    let users = state.stores.users.list(limit, offset).await?;
    let total = state.stores.users.count().await?;

    Ok(ApiResponse::success(json!({
        "users": users,
        "total": total,
        "limit": limit,
        "offset": offset,
    })))
}

/// PUT /api/v1/admin/users/:id/role - Change a user's role
///
/// Writes a history row with the old and new role and drops the target's
/// cache entry so the change takes effect on their next request.
pub async fn role_put(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<RoleRequest>,
) -> ApiResult<Value> {
    require_admin(&current)?;

    let target = state
        .stores
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User {} not found", user_id)))?;

    if target.role == payload.role {
        return Ok(ApiResponse::success(json!({
            "user_id": user_id,
            "role": payload.role,
            "changed": false,
        })));
    }

    state.stores.users.set_role(user_id, payload.role).await?;

    let detail = json!({
        "old": target.role,
        "new": payload.role,
        "changed_by": current.id(),
    });
    if let Err(e) = state
        .stores
        .history
        .append(UserHistory::new(user_id, EVENT_ROLE_CHANGE, detail))
        .await
    {
        tracing::warn!("role history append failed for {}: {}", user_id, e);
    }

    invalidate_user_cache(&state, user_id).await;
    tracing::info!(
        "role of {} changed {} -> {} by {}",
        user_id,
        target.role.as_str(),
        payload.role.as_str(),
        current.id()
    );

    Ok(ApiResponse::success(json!({
        "user_id": user_id,
        "role": payload.role,
        "changed": true,
    })))
}

fn require_admin(current: &CurrentUser) -> Result<(), ApiError> {
    if current.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Administrator access required"))
    }
}
