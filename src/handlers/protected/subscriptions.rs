// handlers/protected/subscriptions.rs - POST /api/subscriptions/create-checkout
use axum::{extract::State, Extension};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::require_parent;
use crate::auth::Identity;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::billing::{CheckoutRequest, PlanType};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest {
    pub plan_type: PlanType,
    #[serde(default)]
    pub addons: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutResponse {
    pub session_id: String,
    pub url: Option<String>,
}

/// Starts a hosted checkout for a plan plus optional addons.
///
/// Input: `{"planType": "monthly" | "yearly" | "forever", "addons": ["video"]}`.
/// Unknown plans fail JSON parsing with 400; unknown addon keys are dropped.
/// Output: `{"sessionId": "cs_...", "url": "https://..."}`.
pub async fn create_checkout(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(body): ApiJson<CreateCheckoutRequest>,
) -> ApiResult<CreateCheckoutResponse> {
    let parent_id = require_parent(identity)?;
    let parent = state
        .store
        .find_parent(parent_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Parent not found"))?;

    let request = CheckoutRequest::new(
        body.plan_type,
        &body.addons,
        parent.id,
        Some(parent.email),
        &state.config.billing.frontend_url,
    );
    let session = state.payments.create_checkout_session(&request).await?;
    info!("Created {} checkout {} for parent {}", body.plan_type.as_str(), session.id, parent_id);

    Ok(ApiResponse::success(CreateCheckoutResponse {
        session_id: session.id,
        url: session.url,
    }))
}
