// Endpoints behind `require_auth`. Handlers receive the resolved
// `CurrentUser` extension; role checks happen here, not in middleware.
pub mod admin;
pub mod auth;
pub mod chat;
pub mod email;
pub mod pages;
pub mod users;

use crate::database::models::User;
use crate::error::ApiError;
use crate::services::{Feature, UsageDecision};
use crate::state::AppState;

/// Count one use of `feature` against the user's monthly allowance.
/// A denied decision becomes the 429 the metered endpoints share.
pub(crate) async fn meter_feature(
    state: &AppState,
    user: &User,
    feature: Feature,
) -> Result<(), ApiError> {
    match state.usage.track(user, feature, 1).await? {
        UsageDecision::Denied { limit } => Err(ApiError::too_many_requests(format!(
            "Monthly {} limit of {} reached",
            feature, limit
        ))),
        _ => Ok(()),
    }
}
