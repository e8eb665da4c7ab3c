//! Integration tests for CSV/JSON downloads and reports.

mod helpers;

use axum::http::{StatusCode, header};
use chrono::Utc;

use visitdesk_entity::user::UserRole;

use helpers::TestApp;

#[tokio::test]
async fn manager_downloads_visitor_csv() {
    let app = TestApp::new().await;
    let staff = app.user_token("alice", UserRole::Staff).await;
    let manager = app.user_token("carol", UserRole::Manager).await;
    app.check_in(&staff, "Jane", "Hill").await;
    app.check_in(&staff, "Sam", "Ward").await;

    let today = Utc::now().date_naive();
    let response = app
        .request(
            "GET",
            &format!("/api/export/visitors?format=csv&from={today}&to={today}"),
            None,
            Some(&manager),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.headers[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    let disposition = response.headers[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap();
    assert_eq!(
        disposition,
        format!("attachment; filename=\"visitors_{today}_{today}.csv\"")
    );

    let text = String::from_utf8(response.raw.clone()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Visitor ID,First Name,Last Name"));
    assert!(text.contains("Jane"));
    assert_eq!(response.headers["x-export-rows"], "2");
}

#[tokio::test]
async fn json_export_is_an_array() {
    let app = TestApp::new().await;
    let admin = app.user_token("root-admin", UserRole::Admin).await;
    app.check_in(&admin, "Jane", "Hill").await;

    let response = app
        .request("GET", "/api/export/visitors?format=json", None, Some(&admin))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn staff_cannot_export() {
    let app = TestApp::new().await;
    let staff = app.user_token("alice", UserRole::Staff).await;

    let response = app
        .request("GET", "/api/export/visitors", None, Some(&staff))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_format_is_rejected() {
    let app = TestApp::new().await;
    let manager = app.user_token("carol", UserRole::Manager).await;

    let response = app
        .request("GET", "/api/export/visitors?format=xlsx", None, Some(&manager))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn dashboard_and_summary_count_todays_visits() {
    let app = TestApp::new().await;
    let staff = app.user_token("alice", UserRole::Staff).await;
    let manager = app.user_token("carol", UserRole::Manager).await;
    let visitor = app.check_in(&staff, "Jane", "Hill").await;
    app.check_in(&staff, "Sam", "Ward").await;
    app.request(
        "POST",
        &format!("/api/visitors/{}/checkout", visitor["id"].as_str().unwrap()),
        None,
        Some(&staff),
    )
    .await;

    let dashboard = app
        .request("GET", "/api/reports/dashboard", None, Some(&manager))
        .await;
    assert_eq!(dashboard.status, StatusCode::OK);
    assert_eq!(dashboard.data()["on_site_now"], 1);
    assert_eq!(dashboard.data()["checked_in_today"], 2);
    assert_eq!(dashboard.data()["checked_out_today"], 1);

    let summary = app
        .request("GET", "/api/reports/summary", None, Some(&manager))
        .await;
    assert_eq!(summary.status, StatusCode::OK);
    assert_eq!(summary.data()["total_visits"], 2);

    let oversized = app
        .request(
            "GET",
            "/api/reports/summary?from=0001-01-01&to=9999-12-31",
            None,
            Some(&manager),
        )
        .await;
    assert_eq!(oversized.status, StatusCode::BAD_REQUEST);

    let denied = app
        .request("GET", "/api/reports/dashboard", None, Some(&staff))
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn audit_export_as_json() {
    let app = TestApp::new().await;
    let staff = app.user_token("alice", UserRole::Staff).await;
    let admin = app.user_token("root-admin", UserRole::Admin).await;
    app.check_in(&staff, "Jane", "Hill").await;

    let response = app
        .request("GET", "/api/export/audit?format=json", None, Some(&admin))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers[header::CONTENT_TYPE], "application/json");
    let entries = response.body.as_array().unwrap();
    assert!(entries.iter().any(|e| e["action"] == "visitor.check_in"));

    let denied = app
        .request("GET", "/api/export/audit", None, Some(&staff))
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
}
