//! Shared helpers for API integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use visitdesk_api::{AppState, build_app};
use visitdesk_core::config::AppConfig;
use visitdesk_database::Stores;
use visitdesk_entity::user::UserRole;
use visitdesk_service::RequestContext;
use visitdesk_service::user::admin::CreateUserRequest;
use visitdesk_storage::SettingsStore;

/// Password accepted by the default policy.
pub const PASSWORD: &str = "Visit0r!Desk#2026xq";

/// Test application over in-memory stores.
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Wired state, for direct service access
    pub state: AppState,
    /// Backing directory for backups and settings
    pub dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub raw: Vec<u8>,
    pub body: Value,
}

impl TestResponse {
    /// The `data` member of a success envelope.
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

impl TestApp {
    /// Create a new test application
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test application after adjusting the configuration.
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = AppConfig::default();
        config.storage.data_root = dir.path().to_string_lossy().into_owned();
        config.worker.enabled = false;
        adjust(&mut config);

        let settings = Arc::new(
            SettingsStore::open(config.storage.settings_path())
                .await
                .expect("Failed to open settings"),
        );
        let state = AppState::build(config, Stores::memory(), settings)
            .await
            .expect("Failed to build state");
        let router = build_app(state.clone());

        Self { router, state, dir }
    }

    /// Create a user with `role` and the shared test password.
    pub async fn create_user(&self, username: &str, role: UserRole) {
        self.state
            .admin_user_service
            .create_user(
                &RequestContext::system(),
                CreateUserRequest {
                    username: username.to_string(),
                    email: None,
                    password: PASSWORD.to_string(),
                    display_name: None,
                    job_title: None,
                    role,
                },
            )
            .await
            .expect("Failed to create test user");
    }

    /// Create a user with `role` and return an access token for it.
    pub async fn user_token(&self, username: &str, role: UserRole) -> String {
        self.create_user(username, role).await;
        self.login(username, PASSWORD).await
    }

    /// Login and return JWT access token
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .request(
                "POST",
                "/api/auth/login",
                Some(json!({ "username": username, "password": password })),
                None,
            )
            .await;

        assert_eq!(
            response.status,
            StatusCode::OK,
            "Login failed: {:?}",
            response.body
        );

        response.data()["access_token"]
            .as_str()
            .expect("No access_token in login response")
            .to_string()
    }

    /// Check in a healthy visitor and return the created record.
    pub async fn check_in(&self, token: &str, first_name: &str, last_name: &str) -> Value {
        let response = self
            .request(
                "POST",
                "/api/visitors",
                Some(json!({
                    "first_name": first_name,
                    "last_name": last_name,
                    "visitor_type": "family",
                    "resident_name": "Margaret Hill",
                    "resident_room": "12B",
                    "purpose": "Afternoon visit",
                    "health_screening": { "temperature_celsius": 36.6 }
                })),
                Some(token),
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Check-in failed: {:?}",
            response.body
        );
        response.data().clone()
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let raw = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body")
            .to_vec();
        let body: Value = serde_json::from_slice(&raw).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            raw,
            body,
        }
    }
}
