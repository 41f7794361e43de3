use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored user. Carries secret fields, so it is never serialized directly;
/// project it into [`PublicUser`] or [`ChannelSummary`] first.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    /// Always stored lowercase.
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub password_hash: String,
    /// SHA-256 fingerprint of the single live refresh token, if any.
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A user without its secret fields. This is also the identity the session
/// gate hands to request processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Narrow user projection used inside aggregation views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub avatar: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelProfile {
    #[serde(flatten)]
    pub user: PublicUser,
    pub subscriber_count: u64,
    pub subscription_count: u64,
    pub is_subscribed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration_seconds: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// Narrow video projection: title, thumbnail, duration, views and owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub thumbnail_url: String,
    pub duration_seconds: f64,
    pub views: i64,
}

/// One watch-history row. `owner` is `None` when the uploader no longer exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchHistoryEntry {
    #[serde(flatten)]
    pub video: VideoSummary,
    pub owner: Option<ChannelSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    /// Position-ordered; the same video may appear more than once.
    pub videos: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TweetRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: Uuid,
    pub video_id: Uuid,
    pub owner_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// What a like edge points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeKind {
    Video,
    Comment,
    Tweet,
}

impl LikeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Comment => "comment",
            Self::Tweet => "tweet",
        }
    }
}

impl fmt::Display for LikeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLikeKind(pub String);

impl fmt::Display for UnknownLikeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown like target kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownLikeKind {}

impl FromStr for LikeKind {
    type Err = UnknownLikeKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(Self::Video),
            "comment" => Ok(Self::Comment),
            "tweet" => Ok(Self::Tweet),
            other => Err(UnknownLikeKind(other.to_string())),
        }
    }
}
