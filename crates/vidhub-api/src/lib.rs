pub mod auth;
pub mod channels;
pub mod error;
pub mod likes;
pub mod media;
pub mod middleware;
pub mod playlists;
pub mod posts;
pub mod state;
pub mod videos;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
};

use crate::media::MAX_MEDIA_SIZE;
use crate::middleware::{optional_auth, require_auth};
use crate::state::AppState;

/// Every route, with auth layers applied. Path parameters share one name per
/// segment position so the public and authenticated routers merge cleanly.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/videos/{id}", get(videos::get))
        .route("/videos/{id}/comments", get(posts::video_comments))
        .route("/channels/{channel}/videos", get(channels::channel_videos))
        .route("/users/{id}/playlists", get(playlists::for_user))
        .route("/users/{id}/tweets", get(posts::user_tweets))
        .route("/playlists/{id}", get(playlists::get))
        .route("/media/{id}", get(media::download_media))
        .with_state(state.clone());

    let viewer_routes = Router::new()
        .route("/channels/{channel}", get(channels::channel_profile))
        .layer(from_fn_with_state(state.clone(), optional_auth))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/change-password", post(auth::change_password))
        .route("/me", get(auth::me).patch(auth::update_me))
        .route("/me/history", get(channels::watch_history))
        .route("/me/liked-videos", get(likes::liked_videos))
        .route("/users/{id}/subscriptions", get(channels::subscribed_channels))
        .route("/channels/{channel}/subscribers", get(channels::channel_subscribers))
        .route("/subscriptions/{channel_id}", post(channels::toggle_subscribe))
        .route("/likes/{kind}/{id}", post(likes::toggle))
        .route("/videos", post(videos::publish))
        .route("/videos/{id}", patch(videos::update).delete(videos::delete))
        .route("/videos/{id}/publish", patch(videos::toggle_publish))
        .route("/videos/{id}/views", post(videos::record_view))
        .route("/videos/{id}/comments", post(posts::add_comment))
        .route("/comments/{id}", patch(posts::update_comment).delete(posts::delete_comment))
        .route("/playlists", post(playlists::create))
        .route("/playlists/{id}", patch(playlists::update).delete(playlists::delete))
        .route(
            "/playlists/{id}/videos/{video_id}",
            post(playlists::add_video).delete(playlists::remove_video),
        )
        .route("/tweets", post(posts::create_tweet))
        .route("/tweets/{id}", patch(posts::update_tweet).delete(posts::delete_tweet))
        .route(
            "/media",
            post(media::upload_media).layer(DefaultBodyLimit::max(MAX_MEDIA_SIZE)),
        )
        .layer(from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(viewer_routes)
        .merge(protected_routes)
}
