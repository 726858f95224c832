use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub token: Option<String>,
}

/// GET /api/v2/exports/:id/download?token=... - Fetch an export file
///
/// The token is the signed link minted at export time; it is bound to this
/// export id and expires. Bad or expired tokens are a 401, a missing file
/// is a 404. The body is the raw CSV, not the JSON envelope.
pub async fn download(
    State(state): State<AppState>,
    Path(export_id): Path<Uuid>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let token = query
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Download token is required"))?;

    let bytes = state.exports.open(export_id, token).await?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}.csv\"", export_id),
        ),
    ];
    Ok((headers, bytes).into_response())
}
