//! Ownership-checked mutations for videos, playlists, tweets and comments.
//!
//! Every mutation loads the entity first, checks the caller owns it, and only
//! then writes.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use vidhub_types::models::{CommentRecord, PlaylistRecord, TweetRecord, VideoRecord};

use crate::credentials::normalize_username;
use crate::error::{CoreError, CoreResult, non_blank, require_field};
use crate::session::Identity;
use crate::store::{ContentStore, CredentialStore, RelationStore};

fn ensure_owner(owner_id: Uuid, actor: &Identity) -> CoreResult<()> {
    if owner_id != actor.id {
        return Err(CoreError::Authorization);
    }
    Ok(())
}

// -- Videos --

/// Fields for a new video. URLs come from the media collaborator.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration_seconds: f64,
    pub is_published: bool,
}

pub fn publish_video<S: ContentStore>(store: &S, owner: &Identity, new: &NewVideo) -> CoreResult<VideoRecord> {
    let video = VideoRecord {
        id: Uuid::new_v4(),
        owner_id: owner.id,
        title: require_field(&new.title, "title")?.to_string(),
        description: new.description.trim().to_string(),
        video_url: require_field(&new.video_url, "video")?.to_string(),
        thumbnail_url: require_field(&new.thumbnail_url, "thumbnail")?.to_string(),
        duration_seconds: new.duration_seconds.max(0.0),
        views: 0,
        is_published: new.is_published,
        created_at: Utc::now(),
    };

    store.insert_video(&video)?;
    info!("User {} published video {}", owner.id, video.id);
    Ok(video)
}

pub fn get_video<S: ContentStore>(store: &S, id: Uuid) -> CoreResult<VideoRecord> {
    store.video_by_id(id)?.ok_or(CoreError::NotFound("video"))
}

#[derive(Debug, Clone, Default)]
pub struct VideoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// Blank fields keep their current value.
pub fn update_video<S: ContentStore>(
    store: &S,
    actor: &Identity,
    id: Uuid,
    changes: &VideoChanges,
) -> CoreResult<VideoRecord> {
    let title = non_blank(changes.title.as_deref());
    let description = non_blank(changes.description.as_deref());
    let thumbnail = non_blank(changes.thumbnail_url.as_deref());
    if title.is_none() && description.is_none() && thumbnail.is_none() {
        return Err(CoreError::Validation("at least one field is required".into()));
    }

    let mut video = get_video(store, id)?;
    ensure_owner(video.owner_id, actor)?;

    if let Some(title) = title {
        video.title = title.to_string();
    }
    if let Some(description) = description {
        video.description = description.to_string();
    }
    if let Some(thumbnail) = thumbnail {
        video.thumbnail_url = thumbnail.to_string();
    }

    store.update_video(&video)?;
    Ok(video)
}

pub fn toggle_publish<S: ContentStore>(store: &S, actor: &Identity, id: Uuid) -> CoreResult<VideoRecord> {
    let mut video = get_video(store, id)?;
    ensure_owner(video.owner_id, actor)?;

    video.is_published = !video.is_published;
    store.update_video(&video)?;
    Ok(video)
}

pub fn delete_video<S: ContentStore>(store: &S, actor: &Identity, id: Uuid) -> CoreResult<VideoRecord> {
    let video = get_video(store, id)?;
    ensure_owner(video.owner_id, actor)?;

    if !store.delete_video(video.id)? {
        return Err(CoreError::NotFound("video"));
    }
    info!("User {} deleted video {}", actor.id, video.id);
    Ok(video)
}

pub fn channel_videos<S>(store: &S, username: &str) -> CoreResult<Vec<VideoRecord>>
where
    S: CredentialStore + ContentStore,
{
    let username = normalize_username(require_field(username, "username")?);
    let channel = store
        .user_by_username(&username)?
        .ok_or(CoreError::NotFound("channel"))?;
    Ok(store.videos_by_owner(channel.id)?)
}

/// Count a view and append it to the viewer's history. Repeat views are
/// appended again.
pub fn record_view<S>(store: &S, viewer: &Identity, video_id: Uuid) -> CoreResult<()>
where
    S: ContentStore + RelationStore,
{
    let video = get_video(store, video_id)?;
    store.increment_views(video.id)?;
    store.append_watch_history(viewer.id, video.id)?;
    Ok(())
}

// -- Playlists --

pub fn create_playlist<S: ContentStore>(
    store: &S,
    owner: &Identity,
    name: &str,
    description: Option<&str>,
) -> CoreResult<PlaylistRecord> {
    let playlist = PlaylistRecord {
        id: Uuid::new_v4(),
        owner_id: owner.id,
        name: require_field(name, "name")?.to_string(),
        description: description.map(str::trim).unwrap_or_default().to_string(),
        videos: Vec::new(),
        created_at: Utc::now(),
    };

    store.insert_playlist(&playlist)?;
    Ok(playlist)
}

pub fn get_playlist<S: ContentStore>(store: &S, id: Uuid) -> CoreResult<PlaylistRecord> {
    store.playlist_by_id(id)?.ok_or(CoreError::NotFound("playlist"))
}

pub fn user_playlists<S>(store: &S, user_id: Uuid) -> CoreResult<Vec<PlaylistRecord>>
where
    S: CredentialStore + ContentStore,
{
    let user = store.user_by_id(user_id)?.ok_or(CoreError::NotFound("user"))?;
    Ok(store.playlists_by_owner(user.id)?)
}

/// Append a video. The same video may be added more than once.
pub fn add_video_to_playlist<S: ContentStore>(
    store: &S,
    actor: &Identity,
    playlist_id: Uuid,
    video_id: Uuid,
) -> CoreResult<PlaylistRecord> {
    let video = get_video(store, video_id)?;
    let playlist = get_playlist(store, playlist_id)?;
    ensure_owner(playlist.owner_id, actor)?;

    store.push_playlist_video(playlist.id, video.id)?;
    get_playlist(store, playlist.id)
}

/// Remove every occurrence of a video.
pub fn remove_video_from_playlist<S: ContentStore>(
    store: &S,
    actor: &Identity,
    playlist_id: Uuid,
    video_id: Uuid,
) -> CoreResult<PlaylistRecord> {
    let playlist = get_playlist(store, playlist_id)?;
    ensure_owner(playlist.owner_id, actor)?;

    store.pull_playlist_video(playlist.id, video_id)?;
    get_playlist(store, playlist.id)
}

pub fn update_playlist<S: ContentStore>(
    store: &S,
    actor: &Identity,
    playlist_id: Uuid,
    name: Option<&str>,
    description: Option<&str>,
) -> CoreResult<PlaylistRecord> {
    let name = non_blank(name);
    let description = non_blank(description);
    if name.is_none() && description.is_none() {
        return Err(CoreError::Validation("at least one field is required".into()));
    }

    let playlist = get_playlist(store, playlist_id)?;
    ensure_owner(playlist.owner_id, actor)?;

    store.update_playlist_details(
        playlist.id,
        name.unwrap_or(&playlist.name),
        description.unwrap_or(&playlist.description),
    )?;
    get_playlist(store, playlist.id)
}

pub fn delete_playlist<S: ContentStore>(store: &S, actor: &Identity, playlist_id: Uuid) -> CoreResult<PlaylistRecord> {
    let playlist = get_playlist(store, playlist_id)?;
    ensure_owner(playlist.owner_id, actor)?;

    if !store.delete_playlist(playlist.id)? {
        return Err(CoreError::NotFound("playlist"));
    }
    Ok(playlist)
}

// -- Tweets --

pub fn create_tweet<S: ContentStore>(store: &S, owner: &Identity, content: &str) -> CoreResult<TweetRecord> {
    let tweet = TweetRecord {
        id: Uuid::new_v4(),
        owner_id: owner.id,
        content: require_field(content, "content")?.to_string(),
        created_at: Utc::now(),
    };
    store.insert_tweet(&tweet)?;
    Ok(tweet)
}

pub fn user_tweets<S>(store: &S, user_id: Uuid) -> CoreResult<Vec<TweetRecord>>
where
    S: CredentialStore + ContentStore,
{
    let user = store.user_by_id(user_id)?.ok_or(CoreError::NotFound("user"))?;
    Ok(store.tweets_by_owner(user.id)?)
}

pub fn update_tweet<S: ContentStore>(
    store: &S,
    actor: &Identity,
    tweet_id: Uuid,
    content: &str,
) -> CoreResult<TweetRecord> {
    let content = require_field(content, "content")?;

    let mut tweet = store.tweet_by_id(tweet_id)?.ok_or(CoreError::NotFound("tweet"))?;
    ensure_owner(tweet.owner_id, actor)?;

    store.update_tweet_content(tweet.id, content)?;
    tweet.content = content.to_string();
    Ok(tweet)
}

pub fn delete_tweet<S: ContentStore>(store: &S, actor: &Identity, tweet_id: Uuid) -> CoreResult<TweetRecord> {
    let tweet = store.tweet_by_id(tweet_id)?.ok_or(CoreError::NotFound("tweet"))?;
    ensure_owner(tweet.owner_id, actor)?;

    if !store.delete_tweet(tweet.id)? {
        return Err(CoreError::NotFound("tweet"));
    }
    Ok(tweet)
}

// -- Comments --

pub fn add_comment<S: ContentStore>(
    store: &S,
    owner: &Identity,
    video_id: Uuid,
    content: &str,
) -> CoreResult<CommentRecord> {
    let content = require_field(content, "content")?;
    let video = get_video(store, video_id)?;

    let comment = CommentRecord {
        id: Uuid::new_v4(),
        video_id: video.id,
        owner_id: owner.id,
        content: content.to_string(),
        created_at: Utc::now(),
    };
    store.insert_comment(&comment)?;
    Ok(comment)
}

pub fn video_comments<S: ContentStore>(store: &S, video_id: Uuid) -> CoreResult<Vec<CommentRecord>> {
    let video = get_video(store, video_id)?;
    Ok(store.comments_for_video(video.id)?)
}

pub fn update_comment<S: ContentStore>(
    store: &S,
    actor: &Identity,
    comment_id: Uuid,
    content: &str,
) -> CoreResult<CommentRecord> {
    let content = require_field(content, "content")?;

    let mut comment = store
        .comment_by_id(comment_id)?
        .ok_or(CoreError::NotFound("comment"))?;
    ensure_owner(comment.owner_id, actor)?;

    store.update_comment_content(comment.id, content)?;
    comment.content = content.to_string();
    Ok(comment)
}

pub fn delete_comment<S: ContentStore>(store: &S, actor: &Identity, comment_id: Uuid) -> CoreResult<CommentRecord> {
    let comment = store
        .comment_by_id(comment_id)?
        .ok_or(CoreError::NotFound("comment"))?;
    ensure_owner(comment.owner_id, actor)?;

    if !store.delete_comment(comment.id)? {
        return Err(CoreError::NotFound("comment"));
    }
    Ok(comment)
}
