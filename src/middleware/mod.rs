pub mod auth;
pub mod rate_limit;
pub mod response;
pub mod security;

pub use auth::jwt_auth_middleware;
pub use rate_limit::{rate_limit_config, rate_limit_envelope, RateLimitConfig};
pub use response::{ApiResponse, ApiResult};
pub use security::{cors_layer, with_security_headers};
