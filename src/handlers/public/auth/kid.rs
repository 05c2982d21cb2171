// handlers/public/auth/kid.rs - POST /api/auth/kid/{register,login}
use axum::extract::State;
use serde::Deserialize;
use tracing::{info, warn};

use super::{AuthResponse, INVALID_CREDENTIALS};
use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::auth::Identity;
use crate::database::models::{KidProfile, NewKid};
use crate::error::ApiError;
use crate::extract::{required, ApiJson};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KidRegisterRequest {
    pub username: String,
    pub password: String,
    pub name: String,
    pub age: Option<i32>,
    pub parent_code: String,
}

#[derive(Debug, Deserialize)]
pub struct KidLoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /api/auth/kid/register
///
/// Input: `{"username", "password", "name", "age", "parentCode"}`. The parent
/// code must belong to an existing parent (400 otherwise, nothing is created);
/// a taken username is also 400, with code `CONFLICT`.
pub async fn kid_register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<KidRegisterRequest>,
) -> ApiResult<AuthResponse<KidProfile>> {
    let username = required("username", &body.username)?.to_string();
    let name = required("name", &body.name)?.to_string();
    required("password", &body.password)?;

    let Some(parent) = state.store.find_parent_by_code(body.parent_code.trim()).await? else {
        return Err(ApiError::bad_request("Invalid parent code"));
    };

    if state.store.find_kid_by_username(&username).await?.is_some() {
        return Err(ApiError::conflict("Username already taken"));
    }

    let password_hash = hash_password_blocking(body.password).await?;
    let kid = state
        .store
        .create_kid(NewKid {
            parent_id: parent.id,
            username,
            password_hash,
            name,
            age: body.age,
        })
        .await?;

    let token = state.tokens.issue(Identity::Kid(kid.id))?;
    info!("Registered kid {} for parent {}", kid.id, parent.id);

    Ok(ApiResponse::success(AuthResponse {
        token,
        user: KidProfile::from(&kid),
        message: None,
    }))
}

/// POST /api/auth/kid/login
pub async fn kid_login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<KidLoginRequest>,
) -> ApiResult<AuthResponse<KidProfile>> {
    let Some(kid) = state.store.find_kid_by_username(body.username.trim()).await? else {
        warn!("Kid login failed: unknown username");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };

    if !verify_password_blocking(body.password, kid.password.clone()).await? {
        warn!("Kid login failed: wrong password for kid {}", kid.id);
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    let token = state.tokens.issue(Identity::Kid(kid.id))?;
    Ok(ApiResponse::success(AuthResponse {
        token,
        user: KidProfile::from(&kid),
        message: None,
    }))
}
