use axum::extract::State;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use super::FinderRequest;
use crate::error::ApiError;
use crate::handlers::protected::meter_feature;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::{Feature, SingleLookupAnswer};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
}

/// POST /api/v3/email/single/ - Budgeted two-step lookup
///
/// Prior-search shortcut, then a quick probe of the top patterns, then a
/// full batch, all inside the overall latency budget. Unverified pattern
/// guesses are never returned.
pub async fn lookup_post(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<FinderRequest>,
) -> ApiResult<SingleLookupAnswer> {
    let (first, last, domain) = payload.validated()?;
    meter_feature(&state, &current.user, Feature::EmailFinder).await?;

    match state
        .finder
        .lookup_single(&current.user, first, last, domain)
        .await
    {
        Ok(answer) => Ok(ApiResponse::success(answer)),
        Err(e) if e.is_not_configured() => {
            tracing::warn!("single lookup degraded to empty result: {}", e);
            Ok(ApiResponse::success(SingleLookupAnswer::empty()))
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /api/v3/email/single/verifier/ - Verify one address in detail
///
/// Always rides BulkMailVerifier because its payload carries fields worth
/// returning alongside the mapped status. Unlike the finder endpoints a
/// missing key here is a hard 500: the caller asked for this provider
/// specifically.
pub async fn detailed_post(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<VerifyRequest>,
) -> ApiResult<Value> {
    let email = payload.email.trim();
    if email.is_empty() {
        return Err(ApiError::bad_request("email must not be empty"));
    }
    meter_feature(&state, &current.user, Feature::EmailVerifier).await?;

    match state.detail_verifier.verify_email_detailed(email).await {
        Ok((status, details)) => Ok(ApiResponse::success(json!({
            "email": email,
            "status": status,
            "provider": "bulkmailverifier",
            "details": details,
        }))),
        Err(e) if e.is_not_configured() => {
            tracing::error!("single verifier called without credentials: {}", e);
            Err(ApiError::internal_server_error(
                "Verification provider is not configured",
            ))
        }
        Err(e) => Err(e.into()),
    }
}
