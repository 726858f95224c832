use std::collections::{BTreeSet, HashMap};

use axum::extract::State;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config;
use crate::email::types::VerificationStatus;
use crate::error::ApiError;
use crate::handlers::protected::meter_feature;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::Feature;
use crate::state::AppState;

const DEFAULT_EMAIL_FIELD: &str = "email";

/// Either a plain address list or CSV row context. In CSV mode addresses
/// are pulled from `email_field` per row and the verified statuses are
/// merged back into a downloadable file.
#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    #[serde(default)]
    pub emails: Vec<String>,
    pub csv_rows: Option<Vec<Map<String, Value>>>,
    pub email_field: Option<String>,
}

/// POST /api/v3/email/bulk/verifier/ - Verify an arbitrary address list
///
/// Rows without a usable address are kept in the merged CSV with status
/// `unknown` but never sent to the provider.
pub async fn bulk_post(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<BulkRequest>,
) -> ApiResult<Value> {
    meter_feature(&state, &current.user, Feature::BulkVerifier).await?;

    let email_field = payload
        .email_field
        .as_deref()
        .unwrap_or(DEFAULT_EMAIL_FIELD);

    let emails: Vec<String> = match &payload.csv_rows {
        Some(rows) => rows
            .iter()
            .filter_map(|row| row_email(row, email_field))
            .collect(),
        None => payload
            .emails
            .iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect(),
    };

    if emails.is_empty() {
        return Err(ApiError::bad_request("No email addresses to verify"));
    }
    let cap = config::config().finder.bulk_max_emails;
    if emails.len() > cap {
        return Err(ApiError::bad_request(format!(
            "Too many addresses: {} exceeds the limit of {}",
            emails.len(),
            cap
        )));
    }

    let verified = state.orchestrator.verify_many(&emails).await?;

    let mut counts: HashMap<&'static str, usize> = HashMap::new();
    let mut results = Map::new();
    let mut by_email: HashMap<&str, VerificationStatus> = HashMap::new();
    for (email, status) in &verified {
        *counts.entry(status.as_str()).or_insert(0) += 1;
        results.insert(email.clone(), json!(status));
        by_email.insert(email, *status);
    }

    let download_url = match &payload.csv_rows {
        Some(rows) => Some(write_merged_csv(&state, rows, email_field, &by_email)?),
        None => None,
    };

    Ok(ApiResponse::success(json!({
        "results": results,
        "total": verified.len(),
        "counts": {
            "valid": counts.get("valid").copied().unwrap_or(0),
            "invalid": counts.get("invalid").copied().unwrap_or(0),
            "catchall": counts.get("catchall").copied().unwrap_or(0),
            "unknown": counts.get("unknown").copied().unwrap_or(0),
        },
        "download_url": download_url,
    })))
}

/// Merge the statuses back into the rows and write the export. Column
/// order is the sorted union of row keys, `verification_status` last.
fn write_merged_csv(
    state: &AppState,
    rows: &[Map<String, Value>],
    email_field: &str,
    by_email: &HashMap<&str, VerificationStatus>,
) -> Result<String, ApiError> {
    let mut columns: BTreeSet<String> = BTreeSet::new();
    for row in rows {
        columns.extend(row.keys().cloned());
    }
    let mut headers: Vec<String> = columns.into_iter().collect();
    headers.push("verification_status".to_string());

    let records: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let status = row_email(row, email_field)
                .and_then(|email| by_email.get(email.as_str()).copied())
                .unwrap_or(VerificationStatus::Unknown);

            let mut record: Vec<String> = headers[..headers.len() - 1]
                .iter()
                .map(|column| cell_text(row.get(column)))
                .collect();
            record.push(status.as_str().to_string());
            record
        })
        .collect();

    let handle = state.exports.write_csv(&headers, &records)?;
    Ok(handle.download_url)
}

fn row_email(row: &Map<String, Value>, email_field: &str) -> Option<String> {
    row.get(email_field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
