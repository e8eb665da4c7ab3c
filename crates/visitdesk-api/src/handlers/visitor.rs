//! Front-desk visitor handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use validator::Validate;

use visitdesk_core::types::pagination::PageResponse;
use visitdesk_entity::visitor::{Visitor, VisitorUpdate};

use crate::dto::request::{CheckInRequest, ScanCheckoutRequest, VisitorQuery};
use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/visitors
pub async fn check_in(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CheckInRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Visitor>>)> {
    req.validate()?;
    let visitor = state.visitor_service.check_in(&auth, req.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(visitor))))
}

/// GET /api/visitors/active
pub async fn active(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<Visitor>>>> {
    let visitors = state.visitor_service.active_visitors(&auth).await?;
    Ok(Json(ApiResponse::ok(visitors)))
}

/// GET /api/visitors
pub async fn search(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<VisitorQuery>,
) -> ApiResult<Json<ApiResponse<PageResponse<Visitor>>>> {
    let filter = query.filter()?;
    let page = state
        .visitor_service
        .search(&auth, &filter, &query.page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// GET /api/visitors/{id}
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Visitor>>> {
    let visitor = state.visitor_service.get(&auth, &id).await?;
    Ok(Json(ApiResponse::ok(visitor)))
}

/// PUT /api/visitors/{id}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<VisitorUpdate>,
) -> ApiResult<Json<ApiResponse<Visitor>>> {
    let visitor = state.visitor_service.update_details(&auth, &id, req).await?;
    Ok(Json(ApiResponse::ok(visitor)))
}

/// DELETE /api/visitors/{id}
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.visitor_service.delete(&auth, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/visitors/{id}/checkout
pub async fn check_out(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Visitor>>> {
    let visitor = state.visitor_service.check_out(&auth, &id).await?;
    Ok(Json(ApiResponse::ok(visitor)))
}

/// POST /api/visitors/checkout/scan
pub async fn check_out_by_scan(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ScanCheckoutRequest>,
) -> ApiResult<Json<ApiResponse<Visitor>>> {
    req.validate()?;
    let visitor = state
        .visitor_service
        .check_out_by_code(&auth, &req.code)
        .await?;
    Ok(Json(ApiResponse::ok(visitor)))
}
