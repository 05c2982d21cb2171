// handlers/public/auth/parent.rs - POST /api/auth/parent/{register,login}
use axum::extract::State;
use serde::Deserialize;
use tracing::{info, warn};

use super::{AuthResponse, INVALID_CREDENTIALS};
use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::auth::{generate_parent_code, Identity};
use crate::database::models::{NewParent, ParentProfile};
use crate::error::ApiError;
use crate::extract::{required, ApiJson};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ParentRegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ParentLoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/auth/parent/register
///
/// Input: `{"email": "...", "password": "...", "name": "..."}`
///
/// Output:
/// ```json
/// {
///   "success": true,
///   "data": {
///     "token": "eyJ...",
///     "user": { "id": 1, "email": "...", "name": "...", "parent_code": "K3X9QZ" },
///     "message": "Account created successfully!"
///   }
/// }
/// ```
///
/// A taken email is 400 with code `CONFLICT`.
pub async fn parent_register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ParentRegisterRequest>,
) -> ApiResult<AuthResponse<ParentProfile>> {
    let email = required("email", &body.email)?.to_string();
    let name = required("name", &body.name)?.to_string();
    required("password", &body.password)?;

    if state.store.find_parent_by_email(&email).await?.is_some() {
        return Err(ApiError::conflict("Email already registered"));
    }

    let password_hash = hash_password_blocking(body.password).await?;
    let parent = state
        .store
        .create_parent(NewParent {
            email,
            password_hash,
            name,
            parent_code: generate_parent_code(),
        })
        .await?;

    let token = state.tokens.issue(Identity::Parent(parent.id))?;
    info!("Registered parent {}", parent.id);

    Ok(ApiResponse::success(AuthResponse {
        token,
        user: ParentProfile::from(&parent),
        message: Some("Account created successfully!"),
    }))
}

/// POST /api/auth/parent/login
///
/// Unknown email and wrong password both answer 401 `Invalid credentials`.
pub async fn parent_login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ParentLoginRequest>,
) -> ApiResult<AuthResponse<ParentProfile>> {
    let Some(parent) = state.store.find_parent_by_email(body.email.trim()).await? else {
        warn!("Parent login failed: unknown email");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };

    if !verify_password_blocking(body.password, parent.password.clone()).await? {
        warn!("Parent login failed: wrong password for parent {}", parent.id);
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    let token = state.tokens.issue(Identity::Parent(parent.id))?;
    Ok(ApiResponse::success(AuthResponse {
        token,
        user: ParentProfile::from(&parent),
        message: None,
    }))
}
