//! Integration tests for the evacuation roster and bulk evacuation.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use visitdesk_entity::user::UserRole;

use helpers::TestApp;

#[tokio::test]
async fn roster_lists_everyone_on_site() {
    let app = TestApp::new().await;
    let staff = app.user_token("alice", UserRole::Staff).await;
    let guard = app.user_token("guard", UserRole::Security).await;
    app.check_in(&staff, "Jane", "Hill").await;
    app.check_in(&staff, "Sam", "Ward").await;

    let response = app
        .request("GET", "/api/evacuation/roster", None, Some(&guard))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["total_on_site"], 2);
    assert_eq!(response.data()["entries"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn evacuate_all_marks_every_visitor() {
    let app = TestApp::new().await;
    let staff = app.user_token("alice", UserRole::Staff).await;
    let guard = app.user_token("guard", UserRole::Security).await;
    app.check_in(&staff, "Jane", "Hill").await;
    app.check_in(&staff, "Sam", "Ward").await;

    let response = app
        .request(
            "POST",
            "/api/evacuation",
            Some(json!({ "scope": "all" })),
            Some(&guard),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["evacuated"], 2);
    assert_eq!(response.data()["failed"], 0);

    let active = app
        .request("GET", "/api/visitors/active", None, Some(&staff))
        .await;
    assert!(active.data().as_array().unwrap().is_empty());

    let history = app
        .request("GET", "/api/visitors?status=evacuated", None, Some(&staff))
        .await;
    assert_eq!(history.data()["total_items"], 2);
}

#[tokio::test]
async fn evacuate_selected_reports_each_outcome() {
    let app = TestApp::new().await;
    let staff = app.user_token("alice", UserRole::Staff).await;
    let on_site = app.check_in(&staff, "Jane", "Hill").await;
    let left = app.check_in(&staff, "Sam", "Ward").await;
    app.request(
        "POST",
        &format!("/api/visitors/{}/checkout", left["id"].as_str().unwrap()),
        None,
        Some(&staff),
    )
    .await;

    let response = app
        .request(
            "POST",
            "/api/evacuation",
            Some(json!({
                "scope": "visitors",
                "visitor_ids": [on_site["id"], left["id"], "VIS-0-NONE"]
            })),
            Some(&staff),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let data = response.data();
    assert_eq!(data["evacuated"], 1);
    assert_eq!(data["skipped"], 2);

    let outcomes = data["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), 3);
    let status_of = |id: &serde_json::Value| {
        outcomes
            .iter()
            .find(|o| &o["visitor_id"] == id)
            .map(|o| o["status"].clone())
            .unwrap()
    };
    assert_eq!(status_of(&on_site["id"]), "evacuated");
    assert_eq!(status_of(&left["id"]), "skipped");
}

#[tokio::test]
async fn evacuation_with_nobody_on_site_is_empty() {
    let app = TestApp::new().await;
    let guard = app.user_token("guard", UserRole::Security).await;

    let response = app
        .request(
            "POST",
            "/api/evacuation",
            Some(json!({ "scope": "all" })),
            Some(&guard),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["evacuated"], 0);
    assert!(response.data()["outcomes"].as_array().unwrap().is_empty());
}
