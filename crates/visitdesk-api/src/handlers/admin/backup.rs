//! Backup and cloud drive handlers.

use axum::Json;
use axum::extract::{Query, State};

use visitdesk_core::error::AppError;
use visitdesk_service::{BackupReport, BackupStatus};
use visitdesk_storage::oauth::DriveConnection;

use crate::dto::request::DriveCallbackQuery;
use crate::dto::response::{ApiResponse, AuthorizeUrlResponse, MessageResponse};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/admin/backup
///
/// Runs synchronously; a run already in progress yields 409.
pub async fn run_backup(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<BackupReport>>> {
    let report = state.backup_service.run(&auth).await?;
    Ok(Json(ApiResponse::ok(report)))
}

/// GET /api/admin/backup/status
pub async fn status(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<BackupStatus>>> {
    let status = state.backup_service.status(&auth).await?;
    Ok(Json(ApiResponse::ok(status)))
}

/// GET /api/admin/backup/drive/authorize
pub async fn drive_authorize(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<AuthorizeUrlResponse>>> {
    let url = state.backup_service.drive_authorize_url(&auth).await?;
    Ok(Json(ApiResponse::ok(AuthorizeUrlResponse { url })))
}

/// GET /api/admin/backup/drive/callback
///
/// Reached by the provider's redirect, so it carries no bearer token; the
/// `state` parameter identifies the administrator who started the flow.
pub async fn drive_callback(
    State(state): State<AppState>,
    Query(query): Query<DriveCallbackQuery>,
) -> ApiResult<Json<ApiResponse<DriveConnection>>> {
    if let Some(error) = query.error {
        return Err(AppError::external(format!("Cloud drive authorization denied: {error}")).into());
    }
    let (Some(code), Some(oauth_state)) = (query.code, query.state) else {
        return Err(AppError::validation("Missing code or state").into());
    };

    let connection = state
        .backup_service
        .connect_drive(&code, &oauth_state)
        .await?;
    Ok(Json(ApiResponse::ok(connection)))
}

/// DELETE /api/admin/backup/drive
pub async fn drive_disconnect(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    state.backup_service.disconnect_drive(&auth).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "Cloud drive disconnected",
    ))))
}
