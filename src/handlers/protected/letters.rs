// handlers/protected/letters.rs - POST/GET /api/letters
use axum::{extract::State, Extension};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::require_kid;
use crate::auth::Identity;
use crate::database::models::{KidLetter, Letter, Responder, ResponseMode};
use crate::error::ApiError;
use crate::extract::{required, ApiJson};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitLetterRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitLetterResponse {
    pub message: &'static str,
    pub letter: Letter,
}

/// POST /api/letters
///
/// Saves the letter to the kid's selected elf. When the owning parent is in
/// `ai` mode the reply is generated and attached before responding, so the
/// returned letter already carries `response` and `responded_by: "ai"`.
///
/// ```json
/// { "success": true, "data": { "message": "Letter sent to the North Pole!", "letter": { ... } } }
/// ```
pub async fn letters_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(body): ApiJson<SubmitLetterRequest>,
) -> ApiResult<SubmitLetterResponse> {
    let kid_id = require_kid(identity)?;

    let kid = state
        .store
        .find_kid(kid_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Kid not found"))?;
    let Some(elf_id) = kid.elf_id else {
        return Err(ApiError::bad_request("Please select an elf friend first"));
    };
    let content = required("content", &body.content)?;

    // Selection is stored unchecked, so a stale elf id is caught here
    let Some(elf) = state.store.find_elf(elf_id).await? else {
        warn!("Kid {} has unknown elf {} selected, letter rejected", kid.id, elf_id);
        return Err(ApiError::bad_request("Please select an elf friend first"));
    };

    let mut letter = state.store.create_letter(kid.id, elf.id, content).await?;
    info!("Kid {} sent letter {} to elf {}", kid.id, letter.id, elf.id);

    if state.store.response_mode_for_kid(kid.id).await? == Some(ResponseMode::Ai) {
        let reply = state.replies.generate(&letter.content, &elf).await;
        if let Some(updated) = state
            .store
            .attach_response(letter.id, &reply, Responder::Ai)
            .await?
        {
            letter = updated;
        }
    }

    Ok(ApiResponse::success(SubmitLetterResponse {
        message: "Letter sent to the North Pole!",
        letter,
    }))
}

/// GET /api/letters - the kid's own letters, newest first
pub async fn letters_get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Vec<KidLetter>> {
    let kid_id = require_kid(identity)?;
    let letters = state.store.list_kid_letters(kid_id).await?;
    Ok(ApiResponse::success(letters))
}
