use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::Store;
use crate::middleware::rate_limit::{rate_limit_config, RateLimitConfig};
use crate::auth::TokenIssuer;
use crate::services::{PaymentGateway, ReplyGenerator};

/// Shared handles passed to every handler and middleware
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub replies: ReplyGenerator,
    pub payments: Arc<dyn PaymentGateway>,
    pub tokens: TokenIssuer,
    /// `None` when rate limiting is off
    pub rate_limit: Option<RateLimitConfig>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn Store>,
        replies: ReplyGenerator,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        let tokens = TokenIssuer::from_config(&config.security);
        let rate_limit = rate_limit_config(&config.api);
        Self {
            config: Arc::new(config),
            store,
            replies,
            payments,
            tokens,
            rate_limit,
        }
    }
}
