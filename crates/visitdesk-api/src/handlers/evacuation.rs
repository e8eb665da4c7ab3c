//! Evacuation handlers.

use axum::Json;
use axum::extract::State;

use visitdesk_service::{EvacuationReport, EvacuationRoster, EvacuationScope};

use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/evacuation/roster
pub async fn roster(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<EvacuationRoster>>> {
    let roster = state.evacuation_service.roster(&auth).await?;
    Ok(Json(ApiResponse::ok(roster)))
}

/// POST /api/evacuation
///
/// Body is `{"scope": "all"}` or
/// `{"scope": "visitors", "visitor_ids": [...]}`.
pub async fn evacuate(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(scope): Json<EvacuationScope>,
) -> ApiResult<Json<ApiResponse<EvacuationReport>>> {
    let report = state.evacuation_service.evacuate(&auth, scope).await?;
    Ok(Json(ApiResponse::ok(report)))
}
