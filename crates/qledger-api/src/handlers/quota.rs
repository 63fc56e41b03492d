//! Quota API handlers.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use qledger_models::time::to_rfc3339;
use qledger_models::{Account, AccountState, ActionKind, PlanEntitlements, PlanTier};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::QuotaSnapshot;
use crate::state::AppState;

/// Longest request text accepted for classification.
const MAX_TEXT_LEN: usize = 32 * 1024;

/// Body of evaluate and consume requests.
#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    /// The user's request text.
    #[serde(default)]
    pub text: String,
    /// Whether files are attached. Never changes the cost.
    #[serde(default)]
    pub has_attachments: bool,
}

impl ActionRequest {
    // Only the leading characters matter to the classifier
    fn text(&self) -> &str {
        if self.text.len() <= MAX_TEXT_LEN {
            return &self.text;
        }
        let mut end = MAX_TEXT_LEN;
        while !self.text.is_char_boundary(end) {
            end -= 1;
        }
        &self.text[..end]
    }
}

/// Account as shown to clients.
#[derive(Debug, Serialize)]
pub struct QuotaResponse {
    pub user_id: String,
    pub plan: PlanTier,
    /// Plan name for display; legacy `free` shows as `basic`.
    pub display_plan: PlanTier,
    pub credits: u32,
    pub weekly_credits: u32,
    pub daily_image_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_limit: Option<u32>,
    pub pro_model_access: bool,
    pub state: AccountState,
    pub last_credit_reset: String,
    pub last_image_reset: String,
}

impl QuotaResponse {
    pub fn new(account: &Account, state: AccountState, entitlements: &PlanEntitlements) -> Self {
        Self {
            user_id: account.user_id.clone(),
            plan: account.plan,
            display_plan: account.plan.normalized(),
            credits: account.credits,
            weekly_credits: entitlements.weekly_credits,
            daily_image_count: account.daily_image_count,
            image_limit: entitlements.image_limit,
            pro_model_access: entitlements.pro_model_access,
            state,
            last_credit_reset: to_rfc3339(account.last_credit_reset),
            last_image_reset: to_rfc3339(account.last_image_reset),
        }
    }
}

impl From<QuotaSnapshot> for QuotaResponse {
    fn from(snapshot: QuotaSnapshot) -> Self {
        Self::new(&snapshot.account, snapshot.state, &snapshot.entitlements)
    }
}

/// Decision preview.
#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub allowed: bool,
    pub kind: ActionKind,
    pub cost: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub upgrade_suggested: bool,
    pub credits: u32,
    pub daily_image_count: u32,
}

/// Committed debit.
#[derive(Debug, Serialize)]
pub struct ConsumeResponse {
    pub kind: ActionKind,
    pub cost: u32,
    pub credits: u32,
    pub daily_image_count: u32,
    pub persisted: bool,
}

/// Get the caller's quota.
pub async fn get_quota(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<QuotaResponse>> {
    let snapshot = state.quota.snapshot(&user.user_id).await?;
    Ok(Json(snapshot.into()))
}

/// Preview whether a request would be allowed. Never debits.
pub async fn evaluate_action(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<ActionRequest>,
) -> ApiResult<Json<EvaluateResponse>> {
    let evaluation = state
        .quota
        .evaluate(&user.user_id, request.text(), request.has_attachments)
        .await?;
    let denial = evaluation.decision.denial();

    Ok(Json(EvaluateResponse {
        allowed: evaluation.decision.is_allowed(),
        kind: evaluation.action.kind,
        cost: evaluation.cost(),
        code: denial.map(|r| r.code()),
        detail: denial.map(|r| r.user_message()),
        upgrade_suggested: denial.map(|r| r.upgrade_suggested()).unwrap_or(false),
        credits: evaluation.account.credits,
        daily_image_count: evaluation.account.daily_image_count,
    }))
}

/// Check and debit a request. Denials map to 402 or 429.
pub async fn consume_action(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<ActionRequest>,
) -> ApiResult<Json<ConsumeResponse>> {
    let outcome = state
        .quota
        .consume(&user.user_id, request.text(), request.has_attachments)
        .await?;

    Ok(Json(ConsumeResponse {
        kind: outcome.action.kind,
        cost: outcome.action.cost,
        credits: outcome.account.credits,
        daily_image_count: outcome.account.daily_image_count,
        persisted: outcome.persisted,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_text_is_cut_on_char_boundary() {
        let request = ActionRequest {
            text: "é".repeat(MAX_TEXT_LEN),
            has_attachments: false,
        };
        let text = request.text();
        assert!(text.len() <= MAX_TEXT_LEN);
        assert!(text.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_missing_fields_default() {
        let request: ActionRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.text(), "");
        assert!(!request.has_attachments);
    }
}
