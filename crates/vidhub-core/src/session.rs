use tracing::debug;

use vidhub_types::models::PublicUser;

use crate::aggregate::Project;
use crate::error::{AuthFailure, CoreResult};
use crate::store::CredentialStore;
use crate::token::TokenService;

/// The authenticated caller. Handlers thread it explicitly into every core
/// call that depends on who is asking.
pub type Identity = PublicUser;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Pick the access credential for a request.
///
/// The cookie wins whenever it carries a value; the bearer header is only
/// consulted when there is no cookie. An invalid cookie is not retried
/// against the header.
pub fn extract_credential<'a>(cookie: Option<&'a str>, bearer: Option<&'a str>) -> CoreResult<&'a str> {
    let present = |v: Option<&'a str>| v.map(str::trim).filter(|v| !v.is_empty());

    present(cookie)
        .or_else(|| present(bearer))
        .ok_or_else(|| AuthFailure::MissingCredential.into())
}

/// Verify an access token and load its subject without secret fields.
pub fn authenticate<S: CredentialStore>(
    tokens: &TokenService,
    store: &S,
    credential: &str,
) -> CoreResult<Identity> {
    let claims = tokens.verify_access_token(credential)?;

    let user = store.user_by_id(claims.sub)?.ok_or_else(|| {
        debug!("Access token subject {} no longer exists", claims.sub);
        AuthFailure::UserNotFound
    })?;

    Ok(user.project())
}
