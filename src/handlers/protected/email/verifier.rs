use axum::extract::State;
use axum::{Extension, Json};

use super::FinderRequest;
use crate::config;
use crate::handlers::protected::meter_feature;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::{Feature, FinderSearchReport, SequentialAnswer};
use crate::state::AppState;

/// POST /api/v3/email/verifier/ - Synchronous batch finder
///
/// Generates candidates and verifies them in provider batches, reporting
/// every valid address plus the winner. A missing provider key degrades to
/// the empty report instead of failing the request.
pub async fn batch_post(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<FinderRequest>,
) -> ApiResult<FinderSearchReport> {
    let (first, last, domain) = payload.validated()?;
    meter_feature(&state, &current.user, Feature::EmailFinder).await?;

    let count = payload
        .count
        .unwrap_or(config::config().finder.default_candidates);

    match state
        .finder
        .find_batch(&current.user, first, last, domain, count)
        .await
    {
        Ok(report) => Ok(ApiResponse::success(report)),
        Err(e) if e.is_not_configured() => {
            tracing::warn!("batch finder degraded to empty result: {}", e);
            Ok(ApiResponse::success(FinderSearchReport::empty()))
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /api/v3/email/verifier/single/ - Sequential-until-first finder
pub async fn sequential_post(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<FinderRequest>,
) -> ApiResult<SequentialAnswer> {
    let (first, last, domain) = payload.validated()?;
    meter_feature(&state, &current.user, Feature::EmailFinder).await?;

    let count = payload
        .count
        .unwrap_or(config::config().finder.default_candidates);

    match state
        .finder
        .find_sequential(&current.user, first, last, domain, count)
        .await
    {
        Ok(answer) => Ok(ApiResponse::success(answer)),
        Err(e) if e.is_not_configured() => {
            tracing::warn!("sequential finder degraded to empty result: {}", e);
            Ok(ApiResponse::success(SequentialAnswer::empty()))
        }
        Err(e) => Err(e.into()),
    }
}
