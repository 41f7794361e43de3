//! Tweets and video comments.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use vidhub_core::{Identity, content};
use vidhub_types::api::ContentRequest;
use vidhub_types::models::{CommentRecord, TweetRecord};

use crate::error::ApiResult;
use crate::state::{AppState, run_blocking};

// -- Tweets --

pub async fn create_tweet(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ContentRequest>,
) -> ApiResult<impl IntoResponse> {
    let tweet =
        run_blocking(&state, move |s| content::create_tweet(&s.db, &identity, &req.content)).await?;
    Ok((StatusCode::CREATED, Json(tweet)))
}

pub async fn user_tweets(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<TweetRecord>>> {
    let tweets = run_blocking(&state, move |s| content::user_tweets(&s.db, user_id)).await?;
    Ok(Json(tweets))
}

pub async fn update_tweet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ContentRequest>,
) -> ApiResult<Json<TweetRecord>> {
    let tweet = run_blocking(&state, move |s| {
        content::update_tweet(&s.db, &identity, id, &req.content)
    })
    .await?;
    Ok(Json(tweet))
}

pub async fn delete_tweet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<StatusCode> {
    run_blocking(&state, move |s| content::delete_tweet(&s.db, &identity, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Comments --

/// POST /videos/{id}/comments
pub async fn add_comment(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ContentRequest>,
) -> ApiResult<impl IntoResponse> {
    let comment = run_blocking(&state, move |s| {
        content::add_comment(&s.db, &identity, video_id, &req.content)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// GET /videos/{id}/comments
pub async fn video_comments(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CommentRecord>>> {
    let comments = run_blocking(&state, move |s| content::video_comments(&s.db, video_id)).await?;
    Ok(Json(comments))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ContentRequest>,
) -> ApiResult<Json<CommentRecord>> {
    let comment = run_blocking(&state, move |s| {
        content::update_comment(&s.db, &identity, id, &req.content)
    })
    .await?;
    Ok(Json(comment))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<StatusCode> {
    run_blocking(&state, move |s| content::delete_comment(&s.db, &identity, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
