use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use vidhub_core::toggle::toggle_subscription;
use vidhub_core::{Identity, aggregate, content};
use vidhub_types::api::ToggleResponse;
use vidhub_types::models::{ChannelProfile, ChannelSummary, VideoRecord, WatchHistoryEntry};

use crate::error::{ApiError, ApiResult};
use crate::middleware::MaybeIdentity;
use crate::state::{AppState, run_blocking};

/// GET /channels/{channel} — `is_subscribed` reflects the caller when signed in.
pub async fn channel_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(MaybeIdentity(viewer)): Extension<MaybeIdentity>,
) -> ApiResult<Json<ChannelProfile>> {
    let profile = run_blocking(&state, move |s| {
        aggregate::channel_profile(&s.db, &username, viewer.as_ref())
    })
    .await?;
    Ok(Json(profile))
}

/// GET /channels/{channel}/videos
pub async fn channel_videos(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<Vec<VideoRecord>>> {
    let videos = run_blocking(&state, move |s| content::channel_videos(&s.db, &username)).await?;
    Ok(Json(videos))
}

/// GET /channels/{channel}/subscribers
pub async fn channel_subscribers(
    State(state): State<AppState>,
    Path(channel): Path<String>,
) -> ApiResult<Json<Vec<ChannelSummary>>> {
    let channel_id = parse_channel_id(&channel)?;
    let subscribers =
        run_blocking(&state, move |s| aggregate::channel_subscribers(&s.db, channel_id)).await?;
    Ok(Json(subscribers))
}

/// GET /users/{id}/subscriptions
pub async fn subscribed_channels(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ChannelSummary>>> {
    let channels =
        run_blocking(&state, move |s| aggregate::subscribed_channels(&s.db, user_id)).await?;
    Ok(Json(channels))
}

/// POST /subscriptions/{channel_id}
pub async fn toggle_subscribe(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<ToggleResponse>> {
    let edge = run_blocking(&state, move |s| toggle_subscription(&s.db, &identity, channel_id)).await?;
    Ok(Json(ToggleResponse {
        active: edge.is_present(),
    }))
}

/// GET /me/history
pub async fn watch_history(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<Vec<WatchHistoryEntry>>> {
    let user_id = identity.id;
    let history = run_blocking(&state, move |s| aggregate::watch_history(&s.db, user_id)).await?;
    Ok(Json(history))
}

/// `/channels/{channel}` is keyed by username for profile routes; the
/// subscriber listing needs the channel's id in that slot.
fn parse_channel_id(raw: &str) -> ApiResult<Uuid> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid channel id: {}", raw)))
}
