//! Integration tests for the front-desk visitor flow.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use visitdesk_entity::user::UserRole;

use helpers::TestApp;

#[tokio::test]
async fn check_in_creates_an_on_site_visitor() {
    let app = TestApp::new().await;
    let token = app.user_token("alice", UserRole::Staff).await;

    let visitor = app.check_in(&token, "Jane", "Hill").await;
    assert_eq!(visitor["status"], "checked_in");
    assert_eq!(visitor["health_screening"]["passed"], true);
    assert!(visitor["badge_number"].as_str().is_some_and(|b| !b.is_empty()));
    assert!(visitor["qr_code"].as_str().is_some_and(|q| !q.is_empty()));

    let active = app
        .request("GET", "/api/visitors/active", None, Some(&token))
        .await;
    assert_eq!(active.status, StatusCode::OK);
    assert_eq!(active.data().as_array().unwrap().len(), 1);
    assert_eq!(active.data()[0]["id"], visitor["id"]);
}

#[tokio::test]
async fn check_in_rejects_missing_fields() {
    let app = TestApp::new().await;
    let token = app.user_token("alice", UserRole::Staff).await;

    let response = app
        .request(
            "POST",
            "/api/visitors",
            Some(json!({ "first_name": "", "last_name": "Hill", "purpose": "" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn failed_screening_blocks_check_in() {
    let app = TestApp::new().await;
    let token = app.user_token("alice", UserRole::Staff).await;

    let response = app
        .request(
            "POST",
            "/api/visitors",
            Some(json!({
                "first_name": "Tom",
                "last_name": "Reed",
                "purpose": "Delivery",
                "health_screening": { "temperature_celsius": 38.4 }
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let active = app
        .request("GET", "/api/visitors/active", None, Some(&token))
        .await;
    assert!(active.data().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn security_cannot_check_in() {
    let app = TestApp::new().await;
    let token = app.user_token("guard", UserRole::Security).await;

    let response = app
        .request(
            "POST",
            "/api/visitors",
            Some(json!({
                "first_name": "Jane",
                "last_name": "Hill",
                "purpose": "Visit",
                "health_screening": { "temperature_celsius": 36.6 }
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"], "FORBIDDEN");
}

#[tokio::test]
async fn check_out_twice_conflicts() {
    let app = TestApp::new().await;
    let token = app.user_token("alice", UserRole::Staff).await;
    let visitor = app.check_in(&token, "Jane", "Hill").await;
    let path = format!("/api/visitors/{}/checkout", visitor["id"].as_str().unwrap());

    let first = app.request("POST", &path, None, Some(&token)).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.data()["status"], "checked_out");
    assert!(first.data()["check_out_time"].is_string());

    let second = app.request("POST", &path, None, Some(&token)).await;
    assert_eq!(second.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn check_out_unknown_visitor_is_not_found() {
    let app = TestApp::new().await;
    let token = app.user_token("alice", UserRole::Staff).await;

    let response = app
        .request("POST", "/api/visitors/V-missing/checkout", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn scan_checks_out_by_badge_and_qr() {
    let app = TestApp::new().await;
    let token = app.user_token("alice", UserRole::Staff).await;
    let by_qr = app.check_in(&token, "Sam", "Ward").await;
    let by_badge = app.check_in(&token, "Jane", "Hill").await;

    let response = app
        .request(
            "POST",
            "/api/visitors/checkout/scan",
            Some(json!({ "code": by_badge["badge_number"] })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["id"], by_badge["id"]);

    let response = app
        .request(
            "POST",
            "/api/visitors/checkout/scan",
            Some(json!({ "code": by_qr["qr_code"] })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["id"], by_qr["id"]);

    let unknown = app
        .request(
            "POST",
            "/api/visitors/checkout/scan",
            Some(json!({ "code": "nothing-matches-this" })),
            Some(&token),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn history_filters_by_status() {
    let app = TestApp::new().await;
    let token = app.user_token("alice", UserRole::Staff).await;
    let gone = app.check_in(&token, "Jane", "Hill").await;
    app.check_in(&token, "Sam", "Ward").await;
    app.request(
        "POST",
        &format!("/api/visitors/{}/checkout", gone["id"].as_str().unwrap()),
        None,
        Some(&token),
    )
    .await;

    let response = app
        .request(
            "GET",
            "/api/visitors?status=checked_out",
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["total_items"], 1);
    assert_eq!(response.data()["items"][0]["id"], gone["id"]);

    let all = app.request("GET", "/api/visitors", None, Some(&token)).await;
    assert_eq!(all.data()["total_items"], 2);
}

#[tokio::test]
async fn history_rejects_reversed_dates() {
    let app = TestApp::new().await;
    let token = app.user_token("alice", UserRole::Staff).await;

    let response = app
        .request(
            "GET",
            "/api/visitors?from=2026-03-10&to=2026-03-01",
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_and_delete_visitor() {
    let app = TestApp::new().await;
    let staff = app.user_token("alice", UserRole::Staff).await;
    let admin = app.user_token("root-admin", UserRole::Admin).await;
    let visitor = app.check_in(&staff, "Jane", "Hill").await;
    let path = format!("/api/visitors/{}", visitor["id"].as_str().unwrap());

    let updated = app
        .request(
            "PUT",
            &path,
            Some(json!({ "notes": "Brought flowers" })),
            Some(&staff),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.data()["notes"], "Brought flowers");

    let denied = app.request("DELETE", &path, None, Some(&staff)).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let deleted = app.request("DELETE", &path, None, Some(&admin)).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let gone = app.request("GET", &path, None, Some(&admin)).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}
