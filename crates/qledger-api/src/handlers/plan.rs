//! Plan change handler.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use qledger_models::PlanTier;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::handlers::quota::QuotaResponse;
use crate::state::AppState;

/// Plan change request.
#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub plan: String,
}

/// Switch the caller's plan. Payment is settled before this is called.
pub async fn change_plan(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<PlanRequest>,
) -> ApiResult<Json<QuotaResponse>> {
    let plan = PlanTier::parse(&request.plan).ok_or_else(|| {
        ApiError::bad_request(format!(
            "Unknown plan '{}'. Must be one of: free, basic, pro, plus, agent",
            request.plan
        ))
    })?;

    let snapshot = state.quota.upgrade(&user.user_id, plan).await?;
    Ok(Json(snapshot.into()))
}
