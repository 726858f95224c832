#![allow(dead_code)]

//! Shared fixture for the integration suites. Requests run in-process
//! through `tower::ServiceExt::oneshot` against in-memory stores, a
//! scripted verification provider and a temp export directory; no sockets,
//! no database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use scout_api_rust::access::Role;
use scout_api_rust::cache::{CachePort, NullCache};
use scout_api_rust::config;
use scout_api_rust::database::models::{Page, PageKind};
use scout_api_rust::database::stores::Stores;
use scout_api_rust::email::providers::{
    build_http_client, BulkMailVerifierClient, ProviderError, VerificationProvider,
};
use scout_api_rust::email::types::VerificationStatus;
use scout_api_rust::email::VerificationOrchestrator;
use scout_api_rust::services::ExportService;
use scout_api_rust::state::AppState;

/// Provider scripted per test: listed addresses answer with their status,
/// everything else is INVALID.
pub struct ScriptedProvider {
    responses: HashMap<String, VerificationStatus>,
    configured: bool,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(results: Vec<(&str, VerificationStatus)>) -> Self {
        Self {
            responses: results.into_iter().map(|(e, s)| (e.to_string(), s)).collect(),
            configured: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            responses: HashMap::new(),
            configured: false,
            calls: AtomicUsize::new(0),
        }
    }

    fn status_of(&self, email: &str) -> VerificationStatus {
        self.responses.get(email).copied().unwrap_or(VerificationStatus::Invalid)
    }
}

#[async_trait]
impl VerificationProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    fn supports_batch(&self) -> bool {
        true
    }

    async fn verify_email(&self, email: &str) -> Result<VerificationStatus, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.status_of(email))
    }

    async fn verify_emails(
        &self,
        emails: &[String],
    ) -> Result<HashMap<String, VerificationStatus>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(emails.iter().map(|e| (e.clone(), self.status_of(e))).collect())
    }
}

/// A wired router plus the state behind it. The temp export directory
/// lives as long as the fixture.
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub exports_dir: TempDir,
}

pub fn test_app_with(provider: Arc<dyn VerificationProvider>, cache: Arc<dyn CachePort>) -> TestApp {
    let cfg = config::config();
    let orchestrator = Arc::new(VerificationOrchestrator::new(
        provider,
        None,
        cfg.finder.clone(),
    ));
    // No BULKMAILVERIFIER_API_KEY in the test environment, so the detailed
    // single verifier is deliberately unconfigured.
    let http = build_http_client(cfg.providers.http_timeout_secs).unwrap();
    let detail_verifier = Arc::new(BulkMailVerifierClient::new(http, &cfg.providers));

    let exports_dir = TempDir::new().unwrap();
    let exports = Arc::new(ExportService::new(exports_dir.path()));

    let state = AppState::assemble(
        Stores::in_memory(),
        cache,
        orchestrator,
        detail_verifier,
        exports,
        None,
    )
    .unwrap();

    TestApp {
        app: scout_api_rust::app::app(state.clone()),
        state,
        exports_dir,
    }
}

/// Fixture with scripted provider results and no user cache.
pub fn test_app_scripted(results: Vec<(&str, VerificationStatus)>) -> TestApp {
    test_app_with(Arc::new(ScriptedProvider::new(results)), Arc::new(NullCache))
}

/// Fixture whose provider answers INVALID for everything.
pub fn test_app() -> TestApp {
    test_app_scripted(Vec::new())
}

/// Fixture whose provider has no credentials at all.
pub fn test_app_unconfigured() -> TestApp {
    test_app_with(Arc::new(ScriptedProvider::unconfigured()), Arc::new(NullCache))
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

pub fn authed_get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn authed_post_json(uri: &str, token: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn authed_put_json(uri: &str, token: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Register through the API and hand back the session token.
pub async fn register_user(app: &Router, name: &str, email: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/auth/register",
            &json!({"email": email, "password": password, "name": name}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED, "registration failed for {email}");

    let json = body_json(response).await;
    json["data"]["token"].as_str().expect("register returns a token").to_string()
}

pub async fn login_user(app: &Router, email: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/auth/login",
            &json!({"email": email, "password": password}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK, "login failed for {email}");

    let json = body_json(response).await;
    json["data"]["token"].as_str().expect("login returns a token").to_string()
}

/// Flip a role straight in the store, the way a migration or seed would.
pub async fn promote(state: &AppState, email: &str, role: Role) {
    let user = state
        .stores
        .users
        .find_by_email(email)
        .await
        .unwrap()
        .expect("user to promote exists");
    state.stores.users.set_role(user.id, role).await.unwrap();
}

pub async fn seed_page(
    state: &AppState,
    page_id: &str,
    kind: PageKind,
    published: bool,
    content: Value,
) {
    state
        .stores
        .pages
        .upsert(Page::new(page_id, kind, content, published))
        .await
        .unwrap();
}

/// Page document with one public and one pro-gated section.
pub fn gated_page_content() -> Value {
    json!({
        "title": "Sample",
        "sections": {
            "intro": {
                "title": "Intro",
                "content": "welcome copy",
                "allowed_roles": [],
                "restriction_type": "none"
            },
            "premium": {
                "title": "Premium",
                "content": "pro only numbers",
                "allowed_roles": ["pro_user"],
                "restriction_type": "full"
            }
        }
    })
}
