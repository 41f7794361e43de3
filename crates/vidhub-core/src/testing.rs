//! In-memory store and fixtures for unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::{Duration, Utc};
use uuid::Uuid;

use vidhub_types::models::{
    CommentRecord, PlaylistRecord, TweetRecord, UserRecord, VideoRecord,
};

use crate::credentials::PasswordScheme;
use crate::error::{StoreError, StoreResult};
use crate::store::{ContentStore, CredentialStore, Edge, EdgePattern, ProfileUpdate, RelationStore};
use crate::token::{TokenConfig, TokenService};

#[derive(Default)]
struct Inner {
    users: Vec<UserRecord>,
    videos: Vec<VideoRecord>,
    playlists: Vec<PlaylistRecord>,
    tweets: Vec<TweetRecord>,
    comments: Vec<CommentRecord>,
    edges: Vec<Edge>,
    history: Vec<(Uuid, Uuid)>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    writes: AtomicUsize,
    fail_next_swap: AtomicBool,
    hide_next_existence_check: AtomicBool,
}

impl MemoryStore {
    fn read<T>(&self, f: impl FnOnce(&Inner) -> T) -> StoreResult<T> {
        let inner = self
            .inner
            .lock()
            .map_err(|e| anyhow::anyhow!("store lock poisoned: {}", e))?;
        Ok(f(&inner))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Inner) -> StoreResult<T>) -> StoreResult<T> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| anyhow::anyhow!("store lock poisoned: {}", e))?;
        f(&mut inner)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn remove_user(&self, id: Uuid) {
        self.inner.lock().unwrap().users.retain(|u| u.id != id);
    }

    pub fn fail_next_swap(&self) {
        self.fail_next_swap.store(true, Ordering::SeqCst);
    }

    pub fn hide_next_existence_check(&self) {
        self.hide_next_existence_check.store(true, Ordering::SeqCst);
    }
}

fn pattern_endpoint(edge: &Edge, pattern: &EdgePattern) -> Option<Uuid> {
    match (*edge, *pattern) {
        (Edge::Subscription { subscriber, channel }, EdgePattern::SubscriptionsBy(id)) if subscriber == id => {
            Some(channel)
        }
        (Edge::Subscription { subscriber, channel }, EdgePattern::SubscribersOf(id)) if channel == id => {
            Some(subscriber)
        }
        (Edge::Like { actor, kind, target }, EdgePattern::LikesBy { actor: a, kind: k })
            if actor == a && kind == k =>
        {
            Some(target)
        }
        (Edge::Like { actor, kind, target }, EdgePattern::LikesOn { kind: k, target: t })
            if kind == k && target == t =>
        {
            Some(actor)
        }
        _ => None,
    }
}

impl CredentialStore for MemoryStore {
    fn insert_user(&self, user: &UserRecord) -> StoreResult<()> {
        self.write(|inner| {
            if inner
                .users
                .iter()
                .any(|u| u.username == user.username || u.email == user.email)
            {
                return Err(StoreError::Conflict);
            }
            inner.users.push(user.clone());
            Ok(())
        })
    }

    fn user_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>> {
        self.read(|inner| inner.users.iter().find(|u| u.id == id).cloned())
    }

    fn user_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        self.read(|inner| inner.users.iter().find(|u| u.username == username).cloned())
    }

    fn user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        self.read(|inner| inner.users.iter().find(|u| u.email == email).cloned())
    }

    fn users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<UserRecord>> {
        // Reverse order so callers cannot rely on the backend's ordering.
        self.read(|inner| {
            inner
                .users
                .iter()
                .rev()
                .filter(|u| ids.contains(&u.id))
                .cloned()
                .collect()
        })
    }

    fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> StoreResult<()> {
        self.write(|inner| {
            if let Some(email) = &update.email {
                if inner.users.iter().any(|u| u.id != id && &u.email == email) {
                    return Err(StoreError::Conflict);
                }
            }
            if let Some(user) = inner.users.iter_mut().find(|u| u.id == id) {
                if let Some(v) = &update.full_name {
                    user.full_name = v.clone();
                }
                if let Some(v) = &update.email {
                    user.email = v.clone();
                }
                if let Some(v) = &update.avatar {
                    user.avatar = v.clone();
                }
                if let Some(v) = &update.cover_image {
                    user.cover_image = Some(v.clone());
                }
            }
            Ok(())
        })
    }

    fn set_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        self.write(|inner| {
            if let Some(user) = inner.users.iter_mut().find(|u| u.id == id) {
                user.password_hash = password_hash.to_string();
            }
            Ok(())
        })
    }

    fn set_refresh_fingerprint(&self, id: Uuid, fingerprint: Option<&str>) -> StoreResult<()> {
        self.write(|inner| {
            if let Some(user) = inner.users.iter_mut().find(|u| u.id == id) {
                user.refresh_token = fingerprint.map(str::to_string);
            }
            Ok(())
        })
    }

    fn swap_refresh_fingerprint(&self, id: Uuid, expected: &str, next: &str) -> StoreResult<bool> {
        if self.fail_next_swap.swap(false, Ordering::SeqCst) {
            return Ok(false);
        }
        self.write(|inner| {
            match inner.users.iter_mut().find(|u| u.id == id) {
                Some(user) if user.refresh_token.as_deref() == Some(expected) => {
                    user.refresh_token = Some(next.to_string());
                    Ok(true)
                }
                _ => Ok(false),
            }
        })
    }
}

impl RelationStore for MemoryStore {
    fn edge_exists(&self, edge: &Edge) -> StoreResult<bool> {
        if self.hide_next_existence_check.swap(false, Ordering::SeqCst) {
            return Ok(false);
        }
        self.read(|inner| inner.edges.contains(edge))
    }

    fn insert_edge(&self, edge: &Edge) -> StoreResult<()> {
        self.write(|inner| {
            if inner.edges.contains(edge) {
                return Err(StoreError::Conflict);
            }
            inner.edges.push(*edge);
            Ok(())
        })
    }

    fn delete_edge(&self, edge: &Edge) -> StoreResult<bool> {
        self.write(|inner| {
            let before = inner.edges.len();
            inner.edges.retain(|e| e != edge);
            Ok(inner.edges.len() != before)
        })
    }

    fn count_edges(&self, pattern: &EdgePattern) -> StoreResult<u64> {
        self.read(|inner| {
            inner
                .edges
                .iter()
                .filter(|e| pattern_endpoint(e, pattern).is_some())
                .count() as u64
        })
    }

    fn edge_endpoints(&self, pattern: &EdgePattern) -> StoreResult<Vec<Uuid>> {
        self.read(|inner| {
            inner
                .edges
                .iter()
                .filter_map(|e| pattern_endpoint(e, pattern))
                .collect()
        })
    }

    fn watch_history(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        self.read(|inner| {
            inner
                .history
                .iter()
                .filter(|(u, _)| *u == user_id)
                .map(|(_, v)| *v)
                .collect()
        })
    }

    fn append_watch_history(&self, user_id: Uuid, video_id: Uuid) -> StoreResult<()> {
        self.write(|inner| {
            inner.history.push((user_id, video_id));
            Ok(())
        })
    }
}

impl ContentStore for MemoryStore {
    fn insert_video(&self, video: &VideoRecord) -> StoreResult<()> {
        self.write(|inner| {
            inner.videos.push(video.clone());
            Ok(())
        })
    }

    fn video_by_id(&self, id: Uuid) -> StoreResult<Option<VideoRecord>> {
        self.read(|inner| inner.videos.iter().find(|v| v.id == id).cloned())
    }

    fn videos_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<VideoRecord>> {
        self.read(|inner| {
            inner
                .videos
                .iter()
                .rev()
                .filter(|v| ids.contains(&v.id))
                .cloned()
                .collect()
        })
    }

    fn videos_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<VideoRecord>> {
        self.read(|inner| {
            inner
                .videos
                .iter()
                .filter(|v| v.owner_id == owner_id)
                .cloned()
                .collect()
        })
    }

    fn update_video(&self, video: &VideoRecord) -> StoreResult<()> {
        self.write(|inner| {
            if let Some(existing) = inner.videos.iter_mut().find(|v| v.id == video.id) {
                existing.title = video.title.clone();
                existing.description = video.description.clone();
                existing.thumbnail_url = video.thumbnail_url.clone();
                existing.is_published = video.is_published;
            }
            Ok(())
        })
    }

    fn delete_video(&self, id: Uuid) -> StoreResult<bool> {
        self.write(|inner| {
            let before = inner.videos.len();
            inner.videos.retain(|v| v.id != id);
            Ok(inner.videos.len() != before)
        })
    }

    fn increment_views(&self, id: Uuid) -> StoreResult<()> {
        self.write(|inner| {
            if let Some(video) = inner.videos.iter_mut().find(|v| v.id == id) {
                video.views += 1;
            }
            Ok(())
        })
    }

    fn insert_playlist(&self, playlist: &PlaylistRecord) -> StoreResult<()> {
        self.write(|inner| {
            inner.playlists.push(playlist.clone());
            Ok(())
        })
    }

    fn playlist_by_id(&self, id: Uuid) -> StoreResult<Option<PlaylistRecord>> {
        self.read(|inner| inner.playlists.iter().find(|p| p.id == id).cloned())
    }

    fn playlists_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<PlaylistRecord>> {
        self.read(|inner| {
            inner
                .playlists
                .iter()
                .filter(|p| p.owner_id == owner_id)
                .cloned()
                .collect()
        })
    }

    fn update_playlist_details(&self, id: Uuid, name: &str, description: &str) -> StoreResult<()> {
        self.write(|inner| {
            if let Some(playlist) = inner.playlists.iter_mut().find(|p| p.id == id) {
                playlist.name = name.to_string();
                playlist.description = description.to_string();
            }
            Ok(())
        })
    }

    fn delete_playlist(&self, id: Uuid) -> StoreResult<bool> {
        self.write(|inner| {
            let before = inner.playlists.len();
            inner.playlists.retain(|p| p.id != id);
            Ok(inner.playlists.len() != before)
        })
    }

    fn push_playlist_video(&self, id: Uuid, video_id: Uuid) -> StoreResult<()> {
        self.write(|inner| {
            if let Some(playlist) = inner.playlists.iter_mut().find(|p| p.id == id) {
                playlist.videos.push(video_id);
            }
            Ok(())
        })
    }

    fn pull_playlist_video(&self, id: Uuid, video_id: Uuid) -> StoreResult<()> {
        self.write(|inner| {
            if let Some(playlist) = inner.playlists.iter_mut().find(|p| p.id == id) {
                playlist.videos.retain(|v| *v != video_id);
            }
            Ok(())
        })
    }

    fn insert_tweet(&self, tweet: &TweetRecord) -> StoreResult<()> {
        self.write(|inner| {
            inner.tweets.push(tweet.clone());
            Ok(())
        })
    }

    fn tweet_by_id(&self, id: Uuid) -> StoreResult<Option<TweetRecord>> {
        self.read(|inner| inner.tweets.iter().find(|t| t.id == id).cloned())
    }

    fn tweets_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<TweetRecord>> {
        self.read(|inner| {
            inner
                .tweets
                .iter()
                .filter(|t| t.owner_id == owner_id)
                .cloned()
                .collect()
        })
    }

    fn update_tweet_content(&self, id: Uuid, content: &str) -> StoreResult<()> {
        self.write(|inner| {
            if let Some(tweet) = inner.tweets.iter_mut().find(|t| t.id == id) {
                tweet.content = content.to_string();
            }
            Ok(())
        })
    }

    fn delete_tweet(&self, id: Uuid) -> StoreResult<bool> {
        self.write(|inner| {
            let before = inner.tweets.len();
            inner.tweets.retain(|t| t.id != id);
            Ok(inner.tweets.len() != before)
        })
    }

    fn insert_comment(&self, comment: &CommentRecord) -> StoreResult<()> {
        self.write(|inner| {
            inner.comments.push(comment.clone());
            Ok(())
        })
    }

    fn comment_by_id(&self, id: Uuid) -> StoreResult<Option<CommentRecord>> {
        self.read(|inner| inner.comments.iter().find(|c| c.id == id).cloned())
    }

    fn comments_for_video(&self, video_id: Uuid) -> StoreResult<Vec<CommentRecord>> {
        self.read(|inner| {
            inner
                .comments
                .iter()
                .filter(|c| c.video_id == video_id)
                .cloned()
                .collect()
        })
    }

    fn update_comment_content(&self, id: Uuid, content: &str) -> StoreResult<()> {
        self.write(|inner| {
            if let Some(comment) = inner.comments.iter_mut().find(|c| c.id == id) {
                comment.content = content.to_string();
            }
            Ok(())
        })
    }

    fn delete_comment(&self, id: Uuid) -> StoreResult<bool> {
        self.write(|inner| {
            let before = inner.comments.len();
            inner.comments.retain(|c| c.id != id);
            Ok(inner.comments.len() != before)
        })
    }
}

/// Reversible stand-in for Argon2 so tests stay fast.
pub struct PlainScheme;

impl PasswordScheme for PlainScheme {
    fn hash(&self, password: &str) -> anyhow::Result<String> {
        Ok(format!("plain${}", password))
    }

    fn verify(&self, password: &str, password_hash: &str) -> bool {
        password_hash == format!("plain${}", password)
    }
}

pub fn token_service() -> TokenService {
    TokenService::new(&TokenConfig {
        access_secret: "test-access-secret".into(),
        refresh_secret: "test-refresh-secret".into(),
        access_ttl: Duration::minutes(15),
        refresh_ttl: Duration::days(10),
    })
}

pub fn sample_user(store: &MemoryStore, username: &str) -> UserRecord {
    let user = UserRecord {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: format!("{}@example.com", username),
        full_name: username.to_uppercase(),
        avatar: format!("/media/{}", username),
        cover_image: None,
        password_hash: PlainScheme.hash("password").unwrap(),
        refresh_token: None,
        created_at: Utc::now(),
    };
    store.insert_user(&user).unwrap();
    user
}

pub fn sample_video(store: &MemoryStore, owner_id: Uuid, title: &str) -> VideoRecord {
    let video = VideoRecord {
        id: Uuid::new_v4(),
        owner_id,
        title: title.to_string(),
        description: format!("about {}", title),
        video_url: format!("/media/{}.mp4", title),
        thumbnail_url: format!("/media/{}.png", title),
        duration_seconds: 30.0,
        views: 0,
        is_published: true,
        created_at: Utc::now(),
    };
    store.insert_video(&video).unwrap();
    video
}
