// middleware/rate_limit.rs - Per-client request limiting under /api
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Request,
    http::{header, HeaderName, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::middleware::NoOpMiddleware;
use tower_governor::{
    governor::{GovernorConfig, GovernorConfigBuilder},
    key_extractor::PeerIpKeyExtractor,
};

use crate::config::ApiConfig;
use crate::error::ApiError;

/// Shared limiter keyed by the peer address from `ConnectInfo`
pub type RateLimitConfig = Arc<GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>>;

const X_RATELIMIT_AFTER: HeaderName = HeaderName::from_static("x-ratelimit-after");

/// Burst of `rate_limit_requests`, refilled one request at a time across the window.
///
/// `None` when limiting is disabled.
pub fn rate_limit_config(api: &ApiConfig) -> Option<RateLimitConfig> {
    if !api.enable_rate_limiting {
        return None;
    }

    let burst = api.rate_limit_requests.max(1);
    let window = Duration::from_secs(api.rate_limit_window_secs.max(1));
    let replenish = (window / burst).max(Duration::from_millis(1));

    let config = GovernorConfigBuilder::default()
        .period(replenish)
        .burst_size(burst)
        .finish();
    if config.is_none() {
        tracing::warn!("Rate limiter rejected quota {} per {:?}, limiting disabled", burst, window);
    }
    config.map(Arc::new)
}

/// Rewrites the limiter's plain-text 429 into the JSON error envelope
pub async fn rate_limit_envelope(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if response.status() != StatusCode::TOO_MANY_REQUESTS {
        return response;
    }

    tracing::warn!("Rate limit exceeded");
    let mut limited = ApiError::too_many_requests("Too many requests, please try again later.").into_response();
    for name in [header::RETRY_AFTER, X_RATELIMIT_AFTER] {
        if let Some(value) = response.headers().get(&name) {
            limited.headers_mut().insert(name, value.clone());
        }
    }
    limited
}
