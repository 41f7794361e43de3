use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use tracing::debug;

use vidhub_core::session::{ACCESS_COOKIE, authenticate, extract_credential};
use vidhub_core::{CoreResult, Identity};

use crate::error::ApiError;
use crate::state::{AppState, run_blocking};

/// Caller identity for routes that also serve anonymous requests.
#[derive(Debug, Clone)]
pub struct MaybeIdentity(pub Option<Identity>);

/// Access token from the `accessToken` cookie, else from `Authorization: Bearer`.
fn credential_from(headers: &HeaderMap) -> CoreResult<String> {
    let jar = CookieJar::from_headers(headers);
    let bearer = headers.typed_get::<Authorization<Bearer>>();

    extract_credential(
        jar.get(ACCESS_COOKIE).map(|c| c.value()),
        bearer.as_ref().map(|b| b.token()),
    )
    .map(str::to_string)
}

/// Verify the access token and insert the caller's [`Identity`].
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let credential = credential_from(req.headers())?;

    let identity =
        run_blocking(&state, move |s| authenticate(&s.tokens, &s.db, &credential)).await?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Like [`require_auth`], but a missing or rejected credential just means an
/// anonymous caller.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let identity = match credential_from(req.headers()) {
        Ok(credential) => {
            match run_blocking(&state, move |s| authenticate(&s.tokens, &s.db, &credential)).await {
                Ok(identity) => Some(identity),
                Err(e) => {
                    debug!("Treating request as anonymous: {}", e);
                    None
                }
            }
        }
        Err(_) => None,
    };

    req.extensions_mut().insert(MaybeIdentity(identity));
    next.run(req).await
}
