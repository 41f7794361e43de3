//! Storage seams.
//!
//! The aggregation engine never joins inside the store. Backends only answer
//! point lookups, batch lookups, edge existence/counts and edge endpoint
//! listings; everything derived is composed in [`crate::aggregate`].

use uuid::Uuid;

use vidhub_types::models::{
    CommentRecord, LikeKind, PlaylistRecord, TweetRecord, UserRecord, VideoRecord,
};

use crate::error::StoreResult;

/// A relation record. Each variant names its own uniqueness key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Subscription { subscriber: Uuid, channel: Uuid },
    Like { actor: Uuid, kind: LikeKind, target: Uuid },
}

/// Selects a set of edges by one fixed endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgePattern {
    /// Edges where the user is the subscriber; endpoints are channel ids.
    SubscriptionsBy(Uuid),
    /// Edges where the user is the channel; endpoints are subscriber ids.
    SubscribersOf(Uuid),
    /// Likes of one kind placed by an actor; endpoints are target ids.
    LikesBy { actor: Uuid, kind: LikeKind },
    /// Likes on one target; endpoints are actor ids.
    LikesOn { kind: LikeKind, target: Uuid },
}

/// Partial profile update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.email.is_none()
            && self.avatar.is_none()
            && self.cover_image.is_none()
    }
}

pub trait CredentialStore {
    /// Fails with [`crate::StoreError::Conflict`] when the username or email
    /// is already taken.
    fn insert_user(&self, user: &UserRecord) -> StoreResult<()>;

    fn user_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>>;

    /// `username` must already be normalized to lowercase.
    fn user_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>>;

    fn user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>>;

    /// Unordered; ids with no user are simply missing from the result.
    fn users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<UserRecord>>;

    fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> StoreResult<()>;

    fn set_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<()>;

    /// Overwrite the refresh-token slot unconditionally.
    fn set_refresh_fingerprint(&self, id: Uuid, fingerprint: Option<&str>) -> StoreResult<()>;

    /// Atomically replace the slot only while it still holds `expected`.
    /// Returns `false` when another writer got there first.
    fn swap_refresh_fingerprint(&self, id: Uuid, expected: &str, next: &str) -> StoreResult<bool>;
}

pub trait RelationStore {
    fn edge_exists(&self, edge: &Edge) -> StoreResult<bool>;

    /// Must fail with [`crate::StoreError::Conflict`] when the edge exists,
    /// enforced by the backend rather than a prior read.
    fn insert_edge(&self, edge: &Edge) -> StoreResult<()>;

    /// Returns whether a row was removed.
    fn delete_edge(&self, edge: &Edge) -> StoreResult<bool>;

    fn count_edges(&self, pattern: &EdgePattern) -> StoreResult<u64>;

    /// The free endpoint of every matching edge, oldest edge first.
    fn edge_endpoints(&self, pattern: &EdgePattern) -> StoreResult<Vec<Uuid>>;

    /// Video ids in append order, duplicates kept.
    fn watch_history(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>>;

    fn append_watch_history(&self, user_id: Uuid, video_id: Uuid) -> StoreResult<()>;
}

pub trait ContentStore {
    // -- Videos --

    fn insert_video(&self, video: &VideoRecord) -> StoreResult<()>;
    fn video_by_id(&self, id: Uuid) -> StoreResult<Option<VideoRecord>>;
    /// Unordered; missing ids are skipped.
    fn videos_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<VideoRecord>>;
    fn videos_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<VideoRecord>>;
    /// Rewrites title, description, thumbnail and publish flag.
    fn update_video(&self, video: &VideoRecord) -> StoreResult<()>;
    fn delete_video(&self, id: Uuid) -> StoreResult<bool>;
    fn increment_views(&self, id: Uuid) -> StoreResult<()>;

    // -- Playlists --

    fn insert_playlist(&self, playlist: &PlaylistRecord) -> StoreResult<()>;
    fn playlist_by_id(&self, id: Uuid) -> StoreResult<Option<PlaylistRecord>>;
    fn playlists_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<PlaylistRecord>>;
    fn update_playlist_details(&self, id: Uuid, name: &str, description: &str) -> StoreResult<()>;
    fn delete_playlist(&self, id: Uuid) -> StoreResult<bool>;
    fn push_playlist_video(&self, id: Uuid, video_id: Uuid) -> StoreResult<()>;
    /// Removes every occurrence of the video.
    fn pull_playlist_video(&self, id: Uuid, video_id: Uuid) -> StoreResult<()>;

    // -- Tweets --

    fn insert_tweet(&self, tweet: &TweetRecord) -> StoreResult<()>;
    fn tweet_by_id(&self, id: Uuid) -> StoreResult<Option<TweetRecord>>;
    fn tweets_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<TweetRecord>>;
    fn update_tweet_content(&self, id: Uuid, content: &str) -> StoreResult<()>;
    fn delete_tweet(&self, id: Uuid) -> StoreResult<bool>;

    // -- Comments --

    fn insert_comment(&self, comment: &CommentRecord) -> StoreResult<()>;
    fn comment_by_id(&self, id: Uuid) -> StoreResult<Option<CommentRecord>>;
    fn comments_for_video(&self, video_id: Uuid) -> StoreResult<Vec<CommentRecord>>;
    fn update_comment_content(&self, id: Uuid, content: &str) -> StoreResult<()>;
    fn delete_comment(&self, id: Uuid) -> StoreResult<bool>;
}

/// Everything the HTTP layer needs from one backend.
pub trait Store: CredentialStore + RelationStore + ContentStore {}

impl<T: CredentialStore + RelationStore + ContentStore> Store for T {}
