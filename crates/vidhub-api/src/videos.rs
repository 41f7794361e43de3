use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use vidhub_core::Identity;
use vidhub_core::content::{self, NewVideo, VideoChanges};
use vidhub_types::api::{PublishVideoRequest, UpdateVideoRequest};
use vidhub_types::models::VideoRecord;

use crate::error::ApiResult;
use crate::state::{AppState, run_blocking};

/// POST /videos — the URLs come from earlier `POST /media` uploads.
pub async fn publish(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<PublishVideoRequest>,
) -> ApiResult<impl IntoResponse> {
    let new = NewVideo {
        title: req.title,
        description: req.description,
        video_url: req.video_url,
        thumbnail_url: req.thumbnail_url,
        duration_seconds: req.duration_seconds,
        is_published: req.is_published,
    };

    let video = run_blocking(&state, move |s| content::publish_video(&s.db, &identity, &new)).await?;
    Ok((StatusCode::CREATED, Json(video)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<VideoRecord>> {
    let video = run_blocking(&state, move |s| content::get_video(&s.db, id)).await?;
    Ok(Json(video))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<UpdateVideoRequest>,
) -> ApiResult<Json<VideoRecord>> {
    let changes = VideoChanges {
        title: req.title,
        description: req.description,
        thumbnail_url: req.thumbnail_url,
    };

    let video =
        run_blocking(&state, move |s| content::update_video(&s.db, &identity, id, &changes)).await?;
    Ok(Json(video))
}

/// PATCH /videos/{id}/publish — flips the published flag.
pub async fn toggle_publish(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<VideoRecord>> {
    let video = run_blocking(&state, move |s| content::toggle_publish(&s.db, &identity, id)).await?;
    Ok(Json(video))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<StatusCode> {
    run_blocking(&state, move |s| content::delete_video(&s.db, &identity, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /videos/{id}/views — counts a view and appends to the caller's history.
pub async fn record_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<StatusCode> {
    run_blocking(&state, move |s| content::record_view(&s.db, &identity, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
