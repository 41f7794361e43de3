use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::PublicUser;

// -- JWT Claims --

/// Claims carried by both access and refresh tokens. The two kinds are told
/// apart by the key that signed them, not by a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: usize,
    pub exp: usize,
    /// Unique per token so two tokens minted in the same second differ.
    pub jti: Uuid,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    /// URL returned by `POST /media`.
    pub avatar: String,
    pub cover_image: Option<String>,
}

/// Either `email` or `username` identifies the account.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}

/// Body fallback for clients that cannot send the refresh cookie.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateAccountRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
}

// -- Videos --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublishVideoRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    #[serde(default)]
    pub duration_seconds: f64,
    #[serde(default = "default_published")]
    pub is_published: bool,
}

fn default_published() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateVideoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
}

// -- Playlists --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePlaylistRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

// -- Tweets / comments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentRequest {
    pub content: String,
}

// -- Edges --

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleResponse {
    /// Whether the edge exists after the toggle.
    pub active: bool,
}

// -- Media --

#[derive(Debug, Serialize, Deserialize)]
pub struct MediaUploadResponse {
    pub url: String,
    pub duration_seconds: Option<f64>,
}
