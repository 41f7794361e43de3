use axum::{
    Extension, Json,
    extract::{Path, State},
};
use tracing::debug;
use uuid::Uuid;

use vidhub_core::toggle::toggle_like;
use vidhub_core::{Identity, aggregate};
use vidhub_types::api::ToggleResponse;
use vidhub_types::models::{LikeKind, VideoSummary};

use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, run_blocking};

/// POST /likes/{kind}/{id} — like or unlike a video, comment or tweet.
pub async fn toggle(
    State(state): State<AppState>,
    Path((kind, target)): Path<(String, Uuid)>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<ToggleResponse>> {
    let kind: LikeKind = kind
        .parse::<LikeKind>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let actor = identity.id;
    let edge = run_blocking(&state, move |s| toggle_like(&s.db, &identity, kind, target)).await?;

    let verb = if edge.is_present() { "liked" } else { "unliked" };
    debug!("User {} {} {} {}", actor, verb, kind, target);
    Ok(Json(ToggleResponse {
        active: edge.is_present(),
    }))
}

/// GET /me/liked-videos
pub async fn liked_videos(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<Vec<VideoSummary>>> {
    let actor = identity.id;
    let videos = run_blocking(&state, move |s| aggregate::liked_videos(&s.db, actor)).await?;
    Ok(Json(videos))
}
