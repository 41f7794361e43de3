use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use vidhub_types::api::Claims;

use crate::error::{AuthFailure, CoreError, CoreResult};
use crate::store::CredentialStore;

/// Signing material and lifetimes. Deployment decides the values.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SigningKeys {
    fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

/// Issues, verifies and rotates HS256 tokens.
///
/// Access tokens are stateless. Refresh tokens are single-slot: the user
/// record holds the fingerprint of the one refresh token that may still be
/// exchanged, and every issue overwrites it. This does not tell a legitimate
/// rotation apart from a stolen token being replayed first; a token family
/// with a version counter would be needed for that.
pub struct TokenService {
    access: SigningKeys,
    refresh: SigningKeys,
    validation: Validation,
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            access: SigningKeys::new(&config.access_secret, config.access_ttl),
            refresh: SigningKeys::new(&config.refresh_secret, config.refresh_ttl),
            validation,
        }
    }

    pub fn issue_access_token(&self, user_id: Uuid) -> CoreResult<String> {
        mint(&self.access, user_id)
    }

    /// Mint a refresh token and make it the only one the user can exchange.
    pub fn issue_refresh_token<S: CredentialStore>(
        &self,
        store: &S,
        user_id: Uuid,
    ) -> CoreResult<String> {
        let token = mint(&self.refresh, user_id)?;
        store.set_refresh_fingerprint(user_id, Some(&fingerprint(&token)))?;
        Ok(token)
    }

    pub fn issue_pair<S: CredentialStore>(&self, store: &S, user_id: Uuid) -> CoreResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user_id)?,
            refresh_token: self.issue_refresh_token(store, user_id)?,
        })
    }

    pub fn verify_access_token(&self, token: &str) -> CoreResult<Claims> {
        self.verify(&self.access, token)
    }

    pub fn verify_refresh_token(&self, token: &str) -> CoreResult<Claims> {
        self.verify(&self.refresh, token)
    }

    /// Exchange a live refresh token for a fresh pair.
    ///
    /// The presented token must match the stored fingerprint. The new
    /// fingerprint is written with a compare-and-swap against the old one, so
    /// of two racing rotations of the same token exactly one wins and the
    /// other fails as revoked.
    pub fn rotate_refresh_token<S: CredentialStore>(
        &self,
        store: &S,
        presented: &str,
    ) -> CoreResult<TokenPair> {
        let claims = self.verify_refresh_token(presented)?;

        let user = store
            .user_by_id(claims.sub)?
            .ok_or(AuthFailure::UserNotFound)?;

        let presented_fingerprint = fingerprint(presented);
        if user.refresh_token.as_deref() != Some(presented_fingerprint.as_str()) {
            warn!("Rejected superseded refresh token for user {}", user.id);
            return Err(AuthFailure::Revoked.into());
        }

        let access_token = mint(&self.access, user.id)?;
        let refresh_token = mint(&self.refresh, user.id)?;

        let swapped = store.swap_refresh_fingerprint(
            user.id,
            &presented_fingerprint,
            &fingerprint(&refresh_token),
        )?;
        if !swapped {
            warn!("Refresh rotation for user {} lost a concurrent race", user.id);
            return Err(AuthFailure::Revoked.into());
        }

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Clear the refresh slot. Access tokens already out stay valid until
    /// they expire.
    pub fn revoke<S: CredentialStore>(&self, store: &S, user_id: Uuid) -> CoreResult<()> {
        store.set_refresh_fingerprint(user_id, None)?;
        info!("Revoked refresh token for user {}", user_id);
        Ok(())
    }

    fn verify(&self, keys: &SigningKeys, token: &str) -> CoreResult<Claims> {
        decode::<Claims>(token, &keys.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthFailure::Expired.into(),
                _ => AuthFailure::InvalidSignature.into(),
            })
    }
}

fn mint(keys: &SigningKeys, user_id: Uuid) -> CoreResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        iat: now.timestamp() as usize,
        exp: (now + keys.ttl).timestamp() as usize,
        jti: Uuid::new_v4(),
    };

    encode(&Header::default(), &claims, &keys.encoding).map_err(|e| CoreError::Internal(e.into()))
}

/// What the credential store keeps instead of the raw refresh token.
pub fn fingerprint(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
