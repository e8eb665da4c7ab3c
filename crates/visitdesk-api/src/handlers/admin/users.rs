//! Admin user management handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use validator::Validate;

use visitdesk_core::types::pagination::PageResponse;
use visitdesk_entity::user::UpdateUser;
use visitdesk_service::user::admin::CreateUserRequest as SvcCreateUser;

use crate::dto::request::{
    ChangeRoleRequest, ChangeStatusRequest, CreateUserRequest, ResetPasswordRequest,
};
use crate::dto::response::{ApiResponse, MessageResponse, UserResponse};
use crate::error::ApiResult;
use crate::extractors::path::parse_uuid;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> ApiResult<Json<ApiResponse<PageResponse<UserResponse>>>> {
    let page = state
        .admin_user_service
        .list_users(&auth, &params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page.map(UserResponse::from))))
}

/// POST /api/admin/users
pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    req.validate()?;
    let user = state
        .admin_user_service
        .create_user(
            &auth,
            SvcCreateUser {
                username: req.username,
                email: req.email,
                password: req.password,
                display_name: req.display_name,
                job_title: req.job_title,
                role: req.role,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(user.into()))))
}

/// GET /api/admin/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let user = state
        .admin_user_service
        .get_user(&auth, parse_uuid(&id)?)
        .await?;
    Ok(Json(ApiResponse::ok(user.into())))
}

/// PUT /api/admin/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateUser>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let user = state
        .admin_user_service
        .update_user(&auth, parse_uuid(&id)?, req)
        .await?;
    Ok(Json(ApiResponse::ok(user.into())))
}

/// PUT /api/admin/users/{id}/role
pub async fn change_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<ChangeRoleRequest>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let user = state
        .admin_user_service
        .change_role(&auth, parse_uuid(&id)?, req.role)
        .await?;
    Ok(Json(ApiResponse::ok(user.into())))
}

/// PUT /api/admin/users/{id}/status
pub async fn change_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<ChangeStatusRequest>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let user = state
        .admin_user_service
        .change_status(&auth, parse_uuid(&id)?, req.status)
        .await?;
    Ok(Json(ApiResponse::ok(user.into())))
}

/// PUT /api/admin/users/{id}/password
pub async fn reset_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    req.validate()?;
    state
        .admin_user_service
        .reset_password(&auth, parse_uuid(&id)?, &req.new_password)
        .await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Password reset"))))
}

/// DELETE /api/admin/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .admin_user_service
        .delete_user(&auth, parse_uuid(&id)?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
