//! Audit log handlers.

use axum::Json;
use axum::extract::{Query, State};

use visitdesk_core::types::pagination::PageResponse;
use visitdesk_entity::audit::AuditLogEntry;

use crate::dto::request::AuditQuery;
use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/admin/audit
pub async fn search_audit(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<AuditQuery>,
) -> ApiResult<Json<ApiResponse<PageResponse<AuditLogEntry>>>> {
    let search = query.search()?;
    let page = state
        .audit_service
        .search(&auth, &search, &query.page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}
