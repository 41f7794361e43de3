use std::path::PathBuf;

use async_trait::async_trait;
use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use vidhub_core::Identity;
use vidhub_types::api::MediaUploadResponse;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// 512 MB upload limit for media
pub const MAX_MEDIA_SIZE: usize = 512 * 1024 * 1024;

/// Where an uploaded blob ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaUpload {
    pub url: String,
    /// Only known when the backend can probe the file.
    pub duration_seconds: Option<f64>,
}

/// Blob storage for avatars, cover images, thumbnails and video files. The
/// rest of the system only ever sees the returned URL.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn store(&self, file_name: &str, bytes: Bytes) -> anyhow::Result<MediaUpload>;

    /// `None` when no blob has that id.
    async fn load(&self, id: &str) -> anyhow::Result<Option<Vec<u8>>>;
}

/// Writes blobs to a local directory and serves them back under `base_url`.
pub struct LocalMediaStore {
    dir: PathBuf,
    base_url: String,
}

impl LocalMediaStore {
    pub fn new(dir: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            dir: dir.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Lowercased extension of `file_name`, if it is short and alphanumeric.
fn extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Accept only ids this store generates: a UUID plus optional extension.
/// Anything else could escape the media directory.
fn is_valid_media_id(id: &str) -> bool {
    let (stem, ext) = match id.split_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (id, None),
    };
    stem.parse::<Uuid>().is_ok() && ext.is_none_or(|ext| extension(&format!("x.{}", ext)).is_some())
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn store(&self, file_name: &str, bytes: Bytes) -> anyhow::Result<MediaUpload> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let id = match extension(file_name) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        tokio::fs::write(self.dir.join(&id), &bytes).await?;

        info!("Stored media {} ({} bytes)", id, bytes.len());
        Ok(MediaUpload {
            url: format!("{}/{}", self.base_url, id),
            duration_seconds: None,
        })
    }

    async fn load(&self, id: &str) -> anyhow::Result<Option<Vec<u8>>> {
        if !is_valid_media_id(id) {
            return Ok(None);
        }
        match tokio::fs::read(self.dir.join(id)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn content_type(id: &str) -> &'static str {
    match extension(id).as_deref() {
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// Original file name; only its extension is kept.
    pub name: Option<String>,
}

/// POST /media — accepts the raw file body, returns `{ url, duration_seconds }`.
pub async fn upload_media(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<UploadQuery>,
    bytes: Bytes,
) -> ApiResult<impl IntoResponse> {
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("file is required".into()));
    }
    if bytes.len() > MAX_MEDIA_SIZE {
        return Err(ApiError::PayloadTooLarge);
    }

    let name = query.name.unwrap_or_default();
    let upload = state.media.store(&name, bytes).await.map_err(|e| {
        error!("Media upload for user {} failed: {:#}", identity.id, e);
        ApiError::Internal("media upload failed".into())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(MediaUploadResponse {
            url: upload.url,
            duration_seconds: upload.duration_seconds,
        }),
    ))
}

/// GET /media/{id}
pub async fn download_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let bytes = state
        .media
        .load(&id)
        .await
        .map_err(|e| {
            error!("Failed to read media {}: {:#}", id, e);
            ApiError::Internal("media read failed".into())
        })?
        .ok_or(vidhub_core::CoreError::NotFound("media"))?;

    Ok(([(header::CONTENT_TYPE, content_type(&id))], bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_ids_cannot_traverse() {
        let id = format!("{}.mp4", Uuid::new_v4());
        assert!(is_valid_media_id(&id));
        assert!(is_valid_media_id(&Uuid::new_v4().to_string()));
        assert!(!is_valid_media_id("../secrets"));
        assert!(!is_valid_media_id(&format!("{}./../x", Uuid::new_v4())));
    }

    #[test]
    fn extension_is_normalized() {
        assert_eq!(extension("Clip.MP4").as_deref(), Some("mp4"));
        assert_eq!(extension("noext"), None);
        assert_eq!(extension("weird.p/g"), None);
    }

    #[tokio::test]
    async fn local_store_round_trips_blob() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = LocalMediaStore::new(dir.path(), "/media/");

        let upload = store.store("avatar.png", Bytes::from_static(b"png-bytes")).await.unwrap();
        assert!(upload.url.starts_with("/media/"));
        assert!(upload.url.ends_with(".png"));
        assert_eq!(upload.duration_seconds, None);

        let id = upload.url.trim_start_matches("/media/");
        assert_eq!(store.load(id).await.unwrap().as_deref(), Some(&b"png-bytes"[..]));
        assert_eq!(store.load(&Uuid::new_v4().to_string()).await.unwrap(), None);
    }
}
