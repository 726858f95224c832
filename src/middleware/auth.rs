use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

use crate::auth::Claims;
use crate::config;
use crate::database::models::User;
use crate::error::ApiError;
use crate::state::AppState;

const USER_CACHE_NAMESPACE: &str = "users";

/// Authenticated user context, resolved against the database on every request.
///
/// The JWT only gets the request through the door. Role, credits and the
/// active flag always come from the stored user so a stale token cannot
/// keep privileges a role change or deactivation already revoked.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub user: User,
}

impl CurrentUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }

    pub fn role(&self) -> crate::access::Role {
        self.user.role
    }

    pub fn is_admin(&self) -> bool {
        self.user.role.is_admin()
    }
}

/// JWT authentication middleware that validates tokens and loads user context
pub async fn require_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;
    let claims = validate_jwt(&token).map_err(ApiError::unauthorized)?;
    let current = resolve_user(&state, claims.sub).await?;

    request.extensions_mut().insert(current);
    Ok(next.run(request).await)
}

/// Like [`require_auth`] but anonymous requests pass through without a
/// [`CurrentUser`] extension. Used on marketing pages where content is
/// filtered down for visitors instead of rejected.
pub async fn optional_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    if let Ok(token) = extract_jwt_from_headers(&headers) {
        if let Ok(claims) = validate_jwt(&token) {
            if let Ok(current) = resolve_user(&state, claims.sub).await {
                request.extensions_mut().insert(current);
            }
        }
    }
    next.run(request).await
}

async fn resolve_user(state: &AppState, user_id: Uuid) -> Result<CurrentUser, ApiError> {
    let cache_key = user_id.to_string();

    if let Some(cached) = state.cache.get(USER_CACHE_NAMESPACE, &cache_key).await {
        match serde_json::from_value::<User>(cached) {
            Ok(user) if user.is_active => return Ok(CurrentUser { user }),
            Ok(_) => return Err(ApiError::forbidden("User account is deactivated")),
            // Stale shape in the cache, fall through to the store.
            Err(_) => state.cache.delete(USER_CACHE_NAMESPACE, &cache_key).await,
        }
    }

    let user = state
        .stores
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::forbidden("User account not found"))?;

    if !user.is_active {
        return Err(ApiError::forbidden("User account is deactivated"));
    }

    let ttl = Duration::from_secs(config::config().cache.user_ttl_secs);
    state
        .cache
        .set(USER_CACHE_NAMESPACE, &cache_key, json!(user), ttl)
        .await;

    Ok(CurrentUser { user })
}

/// Drop a user from the cache after a mutation so the next request
/// sees the stored row.
pub async fn invalidate_user_cache(state: &AppState, user_id: Uuid) {
    state
        .cache
        .delete(USER_CACHE_NAMESPACE, &user_id.to_string())
        .await;
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .or_else(|| headers.get("Authorization"))
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

/// Validate JWT token and extract claims
pub fn validate_jwt(token: &str) -> Result<Claims, String> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err("JWT secret not configured".to_string());
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| format!("Invalid JWT token: {}", e))?;

    Ok(token_data.claims)
}
