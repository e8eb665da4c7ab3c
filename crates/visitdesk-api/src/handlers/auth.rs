//! Auth handlers: login, refresh, me, navigation.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use serde_json::json;
use validator::Validate;

use visitdesk_auth::View;
use visitdesk_auth::navigation::RouteDecision;
use visitdesk_core::error::AppError;
use visitdesk_entity::audit::action::{self, target};
use visitdesk_service::RequestContext;

use crate::dto::request::{LoginRequest, RefreshRequest, RouteQuery};
use crate::dto::response::{
    ApiResponse, LoginResponse, NavigationResponse, RefreshResponse, RouteResponse, UserResponse,
};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::extractors::auth::client_ip;
use crate::state::AppState;

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<LoginResponse>>> {
    req.validate()?;
    let ip = client_ip(&headers);

    let outcome = match state.authenticator.login(&req.username, &req.password).await {
        Ok(outcome) => outcome,
        Err(e) => {
            let ctx = RequestContext {
                username: req.username.trim().to_string(),
                ip_address: ip,
                ..RequestContext::system()
            };
            state
                .audit_service
                .record(
                    &ctx,
                    action::AUTH_LOGIN_FAILED,
                    target::SESSION,
                    None,
                    json!({ "reason": e.message }),
                )
                .await;
            return Err(e.into());
        }
    };

    let user = outcome.user;
    let ctx = RequestContext::new(user.id, user.username.clone(), user.role, ip);
    state
        .audit_service
        .record(
            &ctx,
            action::AUTH_LOGIN,
            target::SESSION,
            Some(&user.id.to_string()),
            json!({ "landing_view": outcome.landing_view }),
        )
        .await;

    let navigation = state.navigation.menu_for(&user.role);
    Ok(Json(ApiResponse::ok(LoginResponse {
        access_token: outcome.tokens.access_token,
        refresh_token: outcome.tokens.refresh_token,
        access_expires_at: outcome.tokens.access_expires_at,
        refresh_expires_at: outcome.tokens.refresh_expires_at,
        user: user.into(),
        landing_view: outcome.landing_view,
        navigation,
    })))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<ApiResponse<RefreshResponse>>> {
    let (access_token, access_expires_at) =
        state.authenticator.refresh(&req.refresh_token).await?;

    Ok(Json(ApiResponse::ok(RefreshResponse {
        access_token,
        access_expires_at,
    })))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let user = state.user_service.get_profile(&auth).await?;
    Ok(Json(ApiResponse::ok(user.into())))
}

/// GET /api/auth/navigation
pub async fn navigation(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Json<ApiResponse<NavigationResponse>> {
    Json(ApiResponse::ok(NavigationResponse {
        role: auth.role,
        landing_view: state.navigation.default_view(&auth.role),
        items: state.navigation.menu_for(&auth.role),
    }))
}

/// GET /api/auth/navigation/route?path=...
pub async fn route(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<RouteQuery>,
) -> ApiResult<Json<ApiResponse<RouteResponse>>> {
    let view = View::from_path(&query.path)
        .ok_or_else(|| AppError::not_found(format!("Unknown route '{}'", query.path)))?;
    let decision = state.navigation.guard(&auth.role, view);
    let path = match decision {
        RouteDecision::Allow(v) | RouteDecision::Redirect(v) => v.path(),
    };
    Ok(Json(ApiResponse::ok(RouteResponse { decision, path })))
}
