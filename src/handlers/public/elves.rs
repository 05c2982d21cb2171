// handlers/public/elves.rs - GET /api/elves
use axum::extract::State;

use crate::database::models::Elf;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// The whole elf catalog in id order
pub async fn elves_list(State(state): State<AppState>) -> ApiResult<Vec<Elf>> {
    let elves = state.store.list_elves().await?;
    Ok(ApiResponse::success(elves))
}
