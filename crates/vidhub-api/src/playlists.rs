use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use vidhub_core::{Identity, content};
use vidhub_types::api::{CreatePlaylistRequest, UpdatePlaylistRequest};
use vidhub_types::models::PlaylistRecord;

use crate::error::ApiResult;
use crate::state::{AppState, run_blocking};

pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreatePlaylistRequest>,
) -> ApiResult<impl IntoResponse> {
    let playlist = run_blocking(&state, move |s| {
        content::create_playlist(&s.db, &identity, &req.name, req.description.as_deref())
    })
    .await?;
    Ok((StatusCode::CREATED, Json(playlist)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PlaylistRecord>> {
    let playlist = run_blocking(&state, move |s| content::get_playlist(&s.db, id)).await?;
    Ok(Json(playlist))
}

/// GET /users/{id}/playlists
pub async fn for_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<PlaylistRecord>>> {
    let playlists = run_blocking(&state, move |s| content::user_playlists(&s.db, user_id)).await?;
    Ok(Json(playlists))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<UpdatePlaylistRequest>,
) -> ApiResult<Json<PlaylistRecord>> {
    let playlist = run_blocking(&state, move |s| {
        content::update_playlist(
            &s.db,
            &identity,
            id,
            req.name.as_deref(),
            req.description.as_deref(),
        )
    })
    .await?;
    Ok(Json(playlist))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<StatusCode> {
    run_blocking(&state, move |s| content::delete_playlist(&s.db, &identity, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /playlists/{id}/videos/{video_id}
pub async fn add_video(
    State(state): State<AppState>,
    Path((id, video_id)): Path<(Uuid, Uuid)>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<PlaylistRecord>> {
    let playlist = run_blocking(&state, move |s| {
        content::add_video_to_playlist(&s.db, &identity, id, video_id)
    })
    .await?;
    Ok(Json(playlist))
}

/// DELETE /playlists/{id}/videos/{video_id} — drops every occurrence.
pub async fn remove_video(
    State(state): State<AppState>,
    Path((id, video_id)): Path<(Uuid, Uuid)>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<PlaylistRecord>> {
    let playlist = run_blocking(&state, move |s| {
        content::remove_video_from_playlist(&s.db, &identity, id, video_id)
    })
    .await?;
    Ok(Json(playlist))
}
