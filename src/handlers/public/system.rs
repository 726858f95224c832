use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - API index with the endpoint map.
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Scout API (Rust)",
            "version": version,
            "description": "Email finding and verification backend with credit metering",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/api/v1/auth/register, /api/v1/auth/login (public), /api/v1/auth/whoami (protected)",
                "users": "/api/v1/users/me/* (protected - profile, credits, usage)",
                "admin": "/api/v1/admin/users[/:id/role] (protected, admin only)",
                "email": "/api/v3/email/* (protected - finder and verifier endpoints)",
                "pages": "/api/v4/marketing/:page_id (public), /api/v4/dashboard-pages/:page_id (protected)",
                "exports": "/api/v2/exports/:id/download?token=... (signed link)",
                "chat": "/api/v1/chat (protected)",
            }
        }
    }))
}

/// GET /health - liveness plus database reachability.
///
/// Reports `degraded` with 503 when the Postgres pool cannot answer a ping.
/// In-memory deployments have no pool and always report ok.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    let database = match &state.pool {
        Some(pool) => sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(pool)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string()),
        None => Ok(()),
    };

    match database {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": if state.pool.is_some() { "ok" } else { "in-memory" }
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e
                }
            })),
        ),
    }
}
