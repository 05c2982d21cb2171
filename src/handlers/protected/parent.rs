// handlers/protected/parent.rs - /api/parent/* handlers
use axum::{extract::State, Extension};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::require_parent;
use crate::auth::Identity;
use crate::database::models::{DbId, KidSummary, Letter, ParentLetter, Responder, ResponseMode};
use crate::error::ApiError;
use crate::extract::{required, ApiJson, ApiPath};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct RespondResponse {
    pub message: &'static str,
    pub letter: Letter,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRequest {
    pub response_mode: ResponseMode,
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub message: &'static str,
    pub response_mode: ResponseMode,
}

/// GET /api/parent/letters - letters from all of the parent's kids, newest first
pub async fn parent_letters_get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Vec<ParentLetter>> {
    let parent_id = require_parent(identity)?;
    let letters = state.store.list_parent_letters(parent_id).await?;
    Ok(ApiResponse::success(letters))
}

/// POST /api/parent/letters/:id/respond
///
/// Overwrites the reply on the letter. Ownership is only enforced when
/// `SECURITY_RESTRICT_PARENT_RESPONSES` is on; an unknown id is 404 either way.
pub async fn letter_respond(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiPath(letter_id): ApiPath<DbId>,
    ApiJson(body): ApiJson<RespondRequest>,
) -> ApiResult<RespondResponse> {
    let parent_id = require_parent(identity)?;
    let response = required("response", &body.response)?;

    if state.config.security.restrict_parent_responses {
        match state.store.letter_parent_id(letter_id).await? {
            None => return Err(ApiError::not_found("Letter not found")),
            Some(owner) if owner != parent_id => {
                warn!("Parent {} tried to answer letter {} owned by parent {}", parent_id, letter_id, owner);
                return Err(ApiError::forbidden("Letter does not belong to your kids"));
            }
            Some(_) => {}
        }
    }

    let letter = state
        .store
        .attach_response(letter_id, response, Responder::Parent)
        .await?
        .ok_or_else(|| ApiError::not_found("Letter not found"))?;
    info!("Parent {} answered letter {}", parent_id, letter_id);

    Ok(ApiResponse::success(RespondResponse {
        message: "Response sent!",
        letter,
    }))
}

/// PATCH /api/parent/settings - `{"responseMode": "ai" | "manual"}`
pub async fn settings_patch(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(body): ApiJson<SettingsRequest>,
) -> ApiResult<SettingsResponse> {
    let parent_id = require_parent(identity)?;
    state.store.set_response_mode(parent_id, body.response_mode).await?;
    info!("Parent {} switched to {} replies", parent_id, body.response_mode.as_str());

    Ok(ApiResponse::success(SettingsResponse {
        message: "Settings updated",
        response_mode: body.response_mode,
    }))
}

/// GET /api/parent/kids
pub async fn kids_get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Vec<KidSummary>> {
    let parent_id = require_parent(identity)?;
    let kids = state.store.list_kids(parent_id).await?;
    Ok(ApiResponse::success(kids))
}
