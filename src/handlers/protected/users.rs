use axum::extract::State;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::models::{current_period, UserHistory, UserProfile, EVENT_PROFILE_UPDATE};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub timezone: Option<String>,
    pub preferences: Option<Value>,
}

/// GET /api/v1/users/me/profile - Current user's profile
///
/// Users without a saved profile get the empty shape rather than a 404, so
/// clients can render the settings form unconditionally.
pub async fn profile_get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<UserProfile> {
    let profile = state
        .stores
        .profiles
        .find_by_user(current.id())
        .await?
        .unwrap_or_else(|| UserProfile::empty(current.id()));

    Ok(ApiResponse::success(profile))
}

/// PUT /api/v1/users/me/profile - Replace the profile
///
/// Full-replace semantics: omitted fields clear. A history row records the
/// before/after shapes; its failure never fails the save.
pub async fn profile_put(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<ProfileRequest>,
) -> ApiResult<UserProfile> {
    let before = state.stores.profiles.find_by_user(current.id()).await?;

    let mut profile = UserProfile::empty(current.id());
    profile.first_name = clean(payload.first_name);
    profile.last_name = clean(payload.last_name);
    profile.company = clean(payload.company);
    profile.phone = clean(payload.phone);
    profile.timezone = clean(payload.timezone);
    if let Some(preferences) = payload.preferences {
        profile.preferences = preferences;
    }

    let saved = state.stores.profiles.upsert(profile).await?;

    let detail = json!({
        "before": before,
        "after": saved,
        "changed_by": current.id(),
    });
    if let Err(e) = state
        .stores
        .history
        .append(UserHistory::new(current.id(), EVENT_PROFILE_UPDATE, detail))
        .await
    {
        tracing::warn!("profile history append failed for {}: {}", current.id(), e);
    }

    Ok(ApiResponse::success(saved))
}

/// GET /api/v1/users/me/credits - Balance and recent credit history
pub async fn credits_get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Value> {
    let summary = state.credits.summary(&current.user).await?;
    Ok(ApiResponse::success(json!({
        "balance": summary.balance,
        "recent": summary.recent,
    })))
}

/// GET /api/v1/users/me/usage - Current-period counters and limits
pub async fn usage_get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Value> {
    let features = state.usage.report(&current.user).await?;
    Ok(ApiResponse::success(json!({
        "period": current_period(),
        "features": features,
    })))
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
