// handlers/public/webhooks.rs - POST /api/webhooks/stripe
use axum::{body::Bytes, extract::State, http::HeaderMap};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::billing::{SignatureError, WebhookEvent, CHECKOUT_COMPLETED};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Payment provider callback.
///
/// The raw body is authenticated with the `Stripe-Signature` header before it
/// is parsed. Any verification failure is 400 `Webhook Error: ...` and changes
/// nothing. A completed checkout marks the parent's subscription active; every
/// other event type is acknowledged untouched. Deliveries are not
/// deduplicated: replays re-apply the same status.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<WebhookAck> {
    let event = verify(&state, &headers, &body).map_err(|e| {
        warn!("Rejected webhook: {}", e);
        ApiError::bad_request(format!("Webhook Error: {e}"))
    })?;

    info!("Webhook event {} ({})", event.id, event.event_type);

    if event.event_type == CHECKOUT_COMPLETED {
        match event.checkout_metadata() {
            Some(meta) => {
                let updated = state
                    .store
                    .activate_subscription(meta.parent_id, &meta.plan_type)
                    .await?;
                if updated {
                    info!("Activated {} subscription for parent {}", meta.plan_type, meta.parent_id);
                } else {
                    warn!("Checkout completed for unknown parent {}", meta.parent_id);
                }
            }
            None => warn!("Checkout event {} has no usable metadata", event.id),
        }
    }

    Ok(ApiResponse::success(WebhookAck { received: true }))
}

fn verify(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<WebhookEvent, SignatureError> {
    let billing = &state.config.billing;
    let secret = billing
        .stripe_webhook_secret
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(SignatureError::NotConfigured)?;
    let header = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(SignatureError::MissingHeader)?;

    WebhookEvent::construct(
        body,
        header,
        secret,
        billing.webhook_tolerance_secs,
        chrono::Utc::now().timestamp(),
    )
}
