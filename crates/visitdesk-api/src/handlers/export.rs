//! File download handlers.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use visitdesk_core::types::DateRange;
use visitdesk_service::ExportFile;

use crate::dto::request::ExportQuery;
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/export/visitors
pub async fn export_visitors(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let range = DateRange::from_optional(query.from, query.to)?;
    let file = state
        .export_service
        .export_visitors(&auth, range, query.format)
        .await?;
    Ok(attachment(file))
}

/// GET /api/export/audit (also mounted at /api/admin/audit/export)
pub async fn export_audit(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let range = DateRange::from_optional(query.from, query.to)?;
    let file = state
        .export_service
        .export_audit(&auth, range, query.format)
        .await?;
    Ok(attachment(file))
}

/// Render an export as a download.
fn attachment(file: ExportFile) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", file.file_name);
    let mut response = (StatusCode::OK, Body::from(file.body)).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(file.content_type),
    );
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    if let Ok(value) = HeaderValue::from_str(&file.rows.to_string()) {
        headers.insert("x-export-rows", value);
    }
    response
}
