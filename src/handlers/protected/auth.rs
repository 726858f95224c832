use axum::Extension;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

/// GET /api/v1/auth/whoami - The resolved current user
///
/// Returns the store-loaded user, not the JWT claims, so a role change or
/// deactivation is visible as soon as the cache entry rolls over.
pub async fn whoami(Extension(current): Extension<CurrentUser>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "user": current.user,
        "role_level": current.role().level(),
    })))
}
