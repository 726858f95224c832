mod common;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use common::{authed_get, authed_post_json, body_json, promote, register_user, test_app_scripted};
use scout_api_rust::access::Role;

#[tokio::test]
async fn free_finder_requests_run_out_after_the_monthly_limit() {
    let fx = test_app_scripted(Vec::new());
    let token = register_user(&fx.app, "Free", "free@example.com", "hunter2hunter2").await;

    let payload = json!({"first_name": "Jane", "domain": "x.com", "count": 3});

    // The free tier allows ten finder requests per calendar month.
    for i in 0..10 {
        let response = fx
            .app
            .clone()
            .oneshot(authed_post_json("/api/v3/email/verifier/", &token, &payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "request {i}");
    }

    let eleventh = fx
        .app
        .clone()
        .oneshot(authed_post_json("/api/v3/email/verifier/", &token, &payload))
        .await
        .unwrap();
    assert_eq!(eleventh.status(), StatusCode::TOO_MANY_REQUESTS);

    let json = body_json(eleventh).await;
    assert_eq!(json["message"], json!("Monthly email_finder limit of 10 reached"));

    // The denied request did not move the counter.
    let usage = fx
        .app
        .clone()
        .oneshot(authed_get("/api/v1/users/me/usage", &token))
        .await
        .unwrap();
    let usage = body_json(usage).await;
    let finder = usage["data"]["features"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["feature"] == json!("email_finder"))
        .unwrap()
        .clone();
    assert_eq!(finder["used"], json!(10));
}

#[tokio::test]
async fn pro_finder_requests_are_counted_but_never_denied() {
    let fx = test_app_scripted(Vec::new());
    let token = register_user(&fx.app, "Pro", "pro@example.com", "hunter2hunter2").await;
    promote(&fx.state, "pro@example.com", Role::ProUser).await;

    let payload = json!({"first_name": "Jane", "domain": "x.com", "count": 3});
    for _ in 0..12 {
        let response = fx
            .app
            .clone()
            .oneshot(authed_post_json("/api/v3/email/verifier/", &token, &payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let usage = fx
        .app
        .clone()
        .oneshot(authed_get("/api/v1/users/me/usage", &token))
        .await
        .unwrap();
    let usage = body_json(usage).await;
    let finder = usage["data"]["features"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["feature"] == json!("email_finder"))
        .unwrap()
        .clone();
    assert_eq!(finder["used"], json!(12));
    assert_eq!(finder["limit"], json!(null));
}

#[tokio::test]
async fn admins_bypass_feature_limits() {
    let fx = test_app_scripted(Vec::new());
    let token = register_user(&fx.app, "Root", "root@example.com", "hunter2hunter2").await;
    promote(&fx.state, "root@example.com", Role::Admin).await;

    // bulk_verifier is disabled even for the free tier, but admins pass.
    let response = fx
        .app
        .clone()
        .oneshot(authed_post_json(
            "/api/v3/email/bulk/verifier/",
            &token,
            &json!({"emails": ["a@x.com"]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn chat_rejects_an_empty_conversation() {
    let fx = test_app_scripted(Vec::new());
    let token = register_user(&fx.app, "Chat", "chat@example.com", "hunter2hunter2").await;

    let response = fx
        .app
        .clone()
        .oneshot(authed_post_json(
            "/api/v1/chat",
            &token,
            &json!({"messages": []}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_without_credentials_is_unavailable() {
    // No CHAT_API_KEY in the test environment.
    let fx = test_app_scripted(Vec::new());
    let token = register_user(&fx.app, "Chat", "chat@example.com", "hunter2hunter2").await;

    let response = fx
        .app
        .clone()
        .oneshot(authed_post_json(
            "/api/v1/chat",
            &token,
            &json!({"messages": [{"role": "user", "content": "hello"}]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json = body_json(response).await;
    assert_eq!(json["message"], json!("Chat is not configured"));
}
