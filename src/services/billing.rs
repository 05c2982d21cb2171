//! Subscription checkout and payment webhooks.
//!
//! Prices are a static table. Sessions are created through the provider's
//! REST API with form-encoded bodies, and webhook payloads are authenticated
//! with the `Stripe-Signature` header scheme: `t=<unix>,v1=<hex>` where the
//! signature is HMAC-SHA256 over `"{t}.{body}"`.

use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::config::BillingConfig;
use crate::database::models::DbId;

type HmacSha256 = Hmac<Sha256>;

pub const CURRENCY: &str = "usd";
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Monthly,
    Yearly,
    Forever,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Monthly => "monthly",
            PlanType::Yearly => "yearly",
            PlanType::Forever => "forever",
        }
    }

    /// Price in cents
    pub fn price(&self) -> i64 {
        match self {
            PlanType::Monthly => 999,
            PlanType::Yearly => 7999,
            PlanType::Forever => 19999,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PlanType::Monthly => "Monthly Magic",
            PlanType::Yearly => "Yearly Wonder",
            PlanType::Forever => "Forever Magic",
        }
    }

    /// Billing interval; `None` for the one-time plan
    pub fn interval(&self) -> Option<&'static str> {
        match self {
            PlanType::Monthly => Some("month"),
            PlanType::Yearly => Some("year"),
            PlanType::Forever => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addon {
    Friendship,
    NiceList,
    Video,
    Bundle,
}

impl Addon {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "friendship" => Some(Addon::Friendship),
            "nicelist" => Some(Addon::NiceList),
            "video" => Some(Addon::Video),
            "bundle" => Some(Addon::Bundle),
            _ => None,
        }
    }

    pub fn price(&self) -> i64 {
        match self {
            Addon::Friendship | Addon::NiceList => 499,
            Addon::Video => 1499,
            Addon::Bundle => 1999,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Addon::Friendship => "Friendship Certificate",
            Addon::NiceList => "Nice List Certificate",
            Addon::Video => "Personalized Video",
            Addon::Bundle => "Ultimate Bundle",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub name: &'static str,
    pub unit_amount: i64,
    pub interval: Option<&'static str>,
    pub quantity: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutMode {
    Subscription,
    Payment,
}

impl CheckoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutMode::Subscription => "subscription",
            CheckoutMode::Payment => "payment",
        }
    }
}

/// The plan first, then one item per recognized addon key in request order
pub fn build_line_items(plan: PlanType, addons: &[String]) -> Vec<LineItem> {
    let mut items = vec![LineItem {
        name: plan.display_name(),
        unit_amount: plan.price(),
        interval: plan.interval(),
        quantity: 1,
    }];

    items.extend(addons.iter().filter_map(|key| Addon::from_key(key)).map(|addon| LineItem {
        name: addon.display_name(),
        unit_amount: addon.price(),
        interval: None,
        quantity: 1,
    }));

    items
}

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub line_items: Vec<LineItem>,
    pub mode: CheckoutMode,
    pub success_url: String,
    pub cancel_url: String,
    pub customer_email: Option<String>,
    pub parent_id: DbId,
    pub plan: PlanType,
}

impl CheckoutRequest {
    pub fn new(
        plan: PlanType,
        addons: &[String],
        parent_id: DbId,
        customer_email: Option<String>,
        frontend_url: &str,
    ) -> Self {
        let base = frontend_url.trim_end_matches('/');
        Self {
            line_items: build_line_items(plan, addons),
            mode: if plan.interval().is_some() {
                CheckoutMode::Subscription
            } else {
                CheckoutMode::Payment
            },
            // The provider substitutes the placeholder with the real session id
            success_url: format!("{base}/success?session_id={{CHECKOUT_SESSION_ID}}"),
            cancel_url: format!("{base}/cancel"),
            customer_email,
            parent_id,
            plan,
        }
    }

    /// Flatten into the bracketed form fields the provider API expects
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("mode".to_string(), self.mode.as_str().to_string()),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
            ("metadata[parent_id]".to_string(), self.parent_id.to_string()),
            ("metadata[plan_type]".to_string(), self.plan.as_str().to_string()),
        ];
        if let Some(email) = &self.customer_email {
            fields.push(("customer_email".to_string(), email.clone()));
        }

        for (i, item) in self.line_items.iter().enumerate() {
            let prefix = format!("line_items[{i}]");
            fields.push((format!("{prefix}[price_data][currency]"), CURRENCY.to_string()));
            fields.push((format!("{prefix}[price_data][product_data][name]"), item.name.to_string()));
            fields.push((format!("{prefix}[price_data][unit_amount]"), item.unit_amount.to_string()));
            if let Some(interval) = item.interval {
                fields.push((format!("{prefix}[price_data][recurring][interval]"), interval.to_string()));
            }
            fields.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
        }

        fields
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment provider is not configured")]
    NotConfigured,

    #[error("payment provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid payment provider endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("payment provider returned {status}: {message}")]
    Provider { status: u16, message: String },
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession, PaymentError>;
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Deserialize)]
struct ProviderErrorDetail {
    message: String,
}

pub struct StripeClient {
    http: Client,
    api_base: String,
    secret_key: Option<String>,
}

impl StripeClient {
    pub fn new(config: &BillingConfig, timeout: Duration) -> Result<Self, PaymentError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_base: config.stripe_api_base.clone(),
            secret_key: config.stripe_secret_key.clone().filter(|key| !key.is_empty()),
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession, PaymentError> {
        let secret_key = self.secret_key.as_deref().ok_or(PaymentError::NotConfigured)?;
        let base = url::Url::parse(&format!("{}/", self.api_base.trim_end_matches('/')))?;
        let endpoint = base.join("v1/checkout/sessions")?;

        let response = self
            .http
            .post(endpoint)
            .bearer_auth(secret_key)
            .form(&request.form_fields())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ProviderErrorBody>().await {
                Ok(body) => body.error.message,
                Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
            };
            return Err(PaymentError::Provider { status: status.as_u16(), message });
        }

        Ok(response.json::<CheckoutSession>().await?)
    }
}

// Webhooks

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("No stripe-signature header value was provided.")]
    MissingHeader,

    #[error("Unable to extract timestamp and signatures from header")]
    MalformedHeader,

    #[error("No signatures found matching the expected signature for payload")]
    NoMatch,

    #[error("Timestamp outside the tolerance zone")]
    Expired,

    #[error("Webhook signing secret is not configured")]
    NotConfigured,

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

fn signature_mac(secret: &str, timestamp: &str, payload: &[u8]) -> Result<HmacSha256, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::NotConfigured)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Check `header` against `payload`; `now` is unix seconds
pub fn verify_webhook_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MalformedHeader)?;
    let signed_at: i64 = timestamp.parse().map_err(|_| SignatureError::MalformedHeader)?;
    if signatures.is_empty() {
        return Err(SignatureError::NoMatch);
    }

    let mac = signature_mac(secret, timestamp, payload)?;
    let matched = signatures.iter().any(|candidate| {
        hex::decode(candidate)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });
    if !matched {
        return Err(SignatureError::NoMatch);
    }

    if tolerance_secs > 0 && (now - signed_at).abs() > tolerance_secs {
        return Err(SignatureError::Expired);
    }

    Ok(())
}

/// Build a header value in the provider's format, used to sign test payloads
pub fn signature_header(payload: &[u8], secret: &str, timestamp: i64) -> Result<String, SignatureError> {
    let timestamp = timestamp.to_string();
    let mac = signature_mac(secret, &timestamp, payload)?;
    Ok(format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes())))
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    pub object: serde_json::Value,
}

/// Metadata stamped onto a checkout session when it was created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutMetadata {
    pub parent_id: DbId,
    pub plan_type: String,
}

impl WebhookEvent {
    /// Verify the signature, then parse the body
    pub fn construct(
        payload: &[u8],
        header: &str,
        secret: &str,
        tolerance_secs: i64,
        now: i64,
    ) -> Result<Self, SignatureError> {
        verify_webhook_signature(payload, header, secret, tolerance_secs, now)?;
        serde_json::from_slice(payload).map_err(|e| SignatureError::InvalidPayload(e.to_string()))
    }

    pub fn checkout_metadata(&self) -> Option<CheckoutMetadata> {
        let metadata = self.data.object.get("metadata")?;
        // Metadata values are always strings on the provider side
        let parent_id = match metadata.get("parent_id")? {
            serde_json::Value::String(s) => s.parse().ok()?,
            serde_json::Value::Number(n) => DbId::try_from(n.as_i64()?).ok()?,
            _ => return None,
        };
        let plan_type = metadata.get("plan_type")?.as_str()?.to_string();
        Some(CheckoutMetadata { parent_id, plan_type })
    }
}
