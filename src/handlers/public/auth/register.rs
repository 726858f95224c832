use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHasher};
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::access::Role;
use crate::auth::{generate_jwt, Claims};
use crate::config;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// POST /api/v1/auth/register - Create an account and return a JWT
///
/// New accounts start as `free_user` with the configured starting credit
/// balance. Duplicate emails are a 409.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Value> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::bad_request("A valid email address is required"));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::bad_request("Password must be at least 8 characters"));
    }
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }

    let password_hash = hash_password(&payload.password)?;
    let credits = config::config().credits.starting_free;
    let user = User::new(email, password_hash, name.to_string(), Role::FreeUser, credits);
    let user = state.stores.users.create(user).await?;

    tracing::info!("registered user {} ({})", user.email, user.id);

    let token = generate_jwt(Claims::new(user.id, user.email.clone(), user.role))?;
    Ok(ApiResponse::created(json!({
        "token": token,
        "user": user,
        "expires_in": config::config().security.jwt_expiry_hours * 3600,
    })))
}

pub(super) fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("password hashing failed: {}", e);
            ApiError::internal_server_error("Failed to create account")
        })
}
