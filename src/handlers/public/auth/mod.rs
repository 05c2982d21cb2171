// handlers/public/auth/mod.rs - Registration and login for both account types
pub mod kid;
pub mod parent;

use serde::Serialize;

pub use kid::{kid_login, kid_register};
pub use parent::{parent_login, parent_register};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Token plus the public profile of the account it was issued for
#[derive(Debug, Serialize)]
pub struct AuthResponse<U: Serialize> {
    pub token: String,
    pub user: U,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}
