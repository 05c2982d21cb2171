// handlers/protected/catalog.rs - GET /api/videos, GET /api/certificates
use axum::{extract::State, Extension};

use super::require_kid;
use crate::auth::Identity;
use crate::database::models::{Certificate, Video};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// Active videos, newest first; open to either role
pub async fn videos_get(
    State(state): State<AppState>,
    Extension(_identity): Extension<Identity>,
) -> ApiResult<Vec<Video>> {
    let videos = state.store.list_active_videos().await?;
    Ok(ApiResponse::success(videos))
}

pub async fn certificates_get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Vec<Certificate>> {
    let kid_id = require_kid(identity)?;
    let certificates = state.store.list_certificates(kid_id).await?;
    Ok(ApiResponse::success(certificates))
}
