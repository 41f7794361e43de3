use std::sync::Arc;

use tracing::error;

use vidhub_core::CoreResult;
use vidhub_core::credentials::PasswordScheme;
use vidhub_core::token::TokenService;
use vidhub_db::Database;

use crate::error::{ApiError, ApiResult};
use crate::media::MediaStore;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenService,
    pub passwords: Box<dyn PasswordScheme>,
    pub media: Arc<dyn MediaStore>,
    /// Sets the `Secure` attribute on session cookies.
    pub secure_cookies: bool,
}

/// Run a core operation off the async runtime. Every core call touches
/// SQLite, and Argon2 hashing is deliberately slow.
pub async fn run_blocking<F, T>(state: &AppState, op: F) -> ApiResult<T>
where
    F: FnOnce(&AppStateInner) -> CoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || op(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.to_string())
        })?
        .map_err(ApiError::from)
}
