//! Router assembly. Route groups mirror the handler tree; auth middleware
//! is layered per group, CORS and tracing over everything.

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{protected, public};
use crate::middleware::{optional_auth, require_auth};
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        .merge(auth_public_routes())
        .merge(marketing_routes(state.clone()))
        .merge(export_routes())
        .merge(protected_routes(state.clone()))
        .fallback(crate::middleware::response::not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
}

fn marketing_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/v4/marketing/:page_id", get(public::pages::marketing_get))
        .layer(from_fn_with_state(state, optional_auth))
}

fn export_routes() -> Router<AppState> {
    Router::new().route("/api/v2/exports/:id/download", get(public::exports::download))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{admin, auth, chat, email, pages, users};

    Router::new()
        .route("/api/v1/auth/whoami", get(auth::whoami))
        .route(
            "/api/v1/users/me/profile",
            get(users::profile_get).put(users::profile_put),
        )
        .route("/api/v1/users/me/credits", get(users::credits_get))
        .route("/api/v1/users/me/usage", get(users::usage_get))
        .route("/api/v1/admin/users", get(admin::users_list))
        .route("/api/v1/admin/users/:id/role", put(admin::role_put))
        // The finder/verifier surface is published with trailing slashes;
        // both spellings are accepted.
        .route("/api/v3/email/verifier", post(email::verifier::batch_post))
        .route("/api/v3/email/verifier/", post(email::verifier::batch_post))
        .route(
            "/api/v3/email/verifier/single",
            post(email::verifier::sequential_post),
        )
        .route(
            "/api/v3/email/verifier/single/",
            post(email::verifier::sequential_post),
        )
        .route("/api/v3/email/bulk/verifier", post(email::bulk::bulk_post))
        .route("/api/v3/email/bulk/verifier/", post(email::bulk::bulk_post))
        .route(
            "/api/v3/email/single/verifier",
            post(email::single::detailed_post),
        )
        .route(
            "/api/v3/email/single/verifier/",
            post(email::single::detailed_post),
        )
        .route("/api/v3/email/single", post(email::single::lookup_post))
        .route("/api/v3/email/single/", post(email::single::lookup_post))
        .route("/api/v4/dashboard-pages/:page_id", get(pages::dashboard_get))
        .route("/api/v1/chat", post(chat::chat_post))
        .layer(from_fn_with_state(state, require_auth))
}
