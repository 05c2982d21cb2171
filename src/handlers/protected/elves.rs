// handlers/protected/elves.rs - POST /api/elves/select
use axum::{extract::State, Extension};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::require_kid;
use crate::auth::Identity;
use crate::database::models::{DbId, Elf};
use crate::extract::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectElfRequest {
    pub elf_id: DbId,
}

#[derive(Debug, Serialize)]
pub struct SelectElfResponse {
    pub message: &'static str,
    pub elf: Option<Elf>,
}

/// Kid picks a pen pal. The id is stored as given; `elf` is null when it
/// does not name a catalog entry.
pub async fn elf_select(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(body): ApiJson<SelectElfRequest>,
) -> ApiResult<SelectElfResponse> {
    let kid_id = require_kid(identity)?;

    state.store.set_kid_elf(kid_id, body.elf_id).await?;
    let elf = state.store.find_elf(body.elf_id).await?;
    info!("Kid {} selected elf {}", kid_id, body.elf_id);

    Ok(ApiResponse::success(SelectElfResponse {
        message: "Elf selected!",
        elf,
    }))
}
