mod common;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use common::{
    authed_get, body_json, gated_page_content, get, promote, register_user, seed_page, test_app,
};
use scout_api_rust::access::Role;
use scout_api_rust::database::models::PageKind;

#[tokio::test]
async fn marketing_page_serves_anonymous_visitors_a_locked_rendition() {
    let fx = test_app();
    seed_page(&fx.state, "landing", PageKind::Marketing, true, gated_page_content()).await;

    let response = fx
        .app
        .clone()
        .oneshot(get("/api/v4/marketing/landing"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["page_id"], json!("landing"));
    assert_eq!(json["data"]["kind"], json!("marketing"));

    let sections = &json["data"]["content"]["sections"];
    assert_eq!(sections["intro"]["is_locked"], json!(false));
    assert_eq!(sections["intro"]["content"], json!("welcome copy"));
    assert_eq!(sections["premium"]["is_locked"], json!(true));
    assert!(sections["premium"].get("content").is_none());
    assert_eq!(sections["premium"]["required_role"], json!("pro_user"));
}

#[tokio::test]
async fn marketing_page_unlocks_with_the_viewer_role() {
    let fx = test_app();
    seed_page(&fx.state, "landing", PageKind::Marketing, true, gated_page_content()).await;

    let free_token = register_user(&fx.app, "Free", "free@example.com", "hunter2hunter2").await;
    let pro_token = register_user(&fx.app, "Pro", "pro@example.com", "hunter2hunter2").await;
    promote(&fx.state, "pro@example.com", Role::ProUser).await;

    let free = fx
        .app
        .clone()
        .oneshot(authed_get("/api/v4/marketing/landing", &free_token))
        .await
        .unwrap();
    let free = body_json(free).await;
    assert_eq!(free["data"]["content"]["sections"]["premium"]["is_locked"], json!(true));

    let pro = fx
        .app
        .clone()
        .oneshot(authed_get("/api/v4/marketing/landing", &pro_token))
        .await
        .unwrap();
    let pro = body_json(pro).await;
    let premium = &pro["data"]["content"]["sections"]["premium"];
    assert_eq!(premium["is_locked"], json!(false));
    assert_eq!(premium["content"], json!("pro only numbers"));
}

#[tokio::test]
async fn marketing_page_is_untouched_for_admins() {
    let fx = test_app();
    let content = gated_page_content();
    seed_page(&fx.state, "landing", PageKind::Marketing, true, content.clone()).await;

    let token = register_user(&fx.app, "Root", "root@example.com", "hunter2hunter2").await;
    promote(&fx.state, "root@example.com", Role::Admin).await;

    let response = fx
        .app
        .clone()
        .oneshot(authed_get("/api/v4/marketing/landing", &token))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"]["content"], content);
}

#[tokio::test]
async fn marketing_page_with_a_bad_token_still_serves_the_public_rendition() {
    let fx = test_app();
    seed_page(&fx.state, "landing", PageKind::Marketing, true, gated_page_content()).await;

    let response = fx
        .app
        .clone()
        .oneshot(authed_get("/api/v4/marketing/landing", "not-a-jwt"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["content"]["sections"]["premium"]["is_locked"], json!(true));
}

#[tokio::test]
async fn unpublished_and_unknown_marketing_pages_are_404() {
    let fx = test_app();
    seed_page(&fx.state, "draft", PageKind::Marketing, false, gated_page_content()).await;

    let draft = fx.app.clone().oneshot(get("/api/v4/marketing/draft")).await.unwrap();
    assert_eq!(draft.status(), StatusCode::NOT_FOUND);

    let unknown = fx.app.clone().oneshot(get("/api/v4/marketing/missing")).await.unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn page_kinds_do_not_leak_into_each_other() {
    let fx = test_app();
    // Same slug, dashboard collection only.
    seed_page(&fx.state, "home", PageKind::Dashboard, true, gated_page_content()).await;

    let response = fx.app.clone().oneshot(get("/api/v4/marketing/home")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dashboard_pages_require_authentication() {
    let fx = test_app();
    seed_page(&fx.state, "home", PageKind::Dashboard, true, gated_page_content()).await;

    let response = fx
        .app
        .clone()
        .oneshot(get("/api/v4/dashboard-pages/home"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn dashboard_pages_serve_unpublished_documents_filtered_by_role() {
    let fx = test_app();
    // No publish gate on the dashboard collection.
    seed_page(&fx.state, "home", PageKind::Dashboard, false, gated_page_content()).await;

    let token = register_user(&fx.app, "Member", "member@example.com", "hunter2hunter2").await;

    let response = fx
        .app
        .clone()
        .oneshot(authed_get("/api/v4/dashboard-pages/home", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["kind"], json!("dashboard"));
    let sections = &json["data"]["content"]["sections"];
    assert_eq!(sections["intro"]["is_locked"], json!(false));
    assert_eq!(sections["premium"]["is_locked"], json!(true));
}
