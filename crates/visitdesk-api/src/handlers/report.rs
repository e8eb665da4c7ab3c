//! Dashboard and summary handlers.

use axum::Json;
use axum::extract::{Query, State};

use visitdesk_service::{DashboardStats, VisitSummary};

use crate::dto::request::RangeQuery;
use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/reports/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<DashboardStats>>> {
    let stats = state.report_service.dashboard(&auth).await?;
    Ok(Json(ApiResponse::ok(stats)))
}

/// GET /api/reports/summary
pub async fn summary(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Json<ApiResponse<VisitSummary>>> {
    let summary = state.report_service.summary(&auth, query.range()?).await?;
    Ok(Json(ApiResponse::ok(summary)))
}
