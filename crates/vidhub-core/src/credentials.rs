use anyhow::anyhow;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use vidhub_types::models::{PublicUser, UserRecord};

use crate::aggregate::Project;
use crate::error::{AuthFailure, CoreError, CoreResult, non_blank, require_field};
use crate::store::{CredentialStore, ProfileUpdate};
use crate::token::{TokenPair, TokenService};

/// One-way password function. The algorithm is a deployment choice.
pub trait PasswordScheme: Send + Sync {
    fn hash(&self, password: &str) -> anyhow::Result<String>;
    fn verify(&self, password: &str, password_hash: &str) -> bool;
}

/// Argon2id with a random salt per hash.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Scheme;

impl PasswordScheme for Argon2Scheme {
    fn hash(&self, password: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("Password hashing failed: {}", e))?
            .to_string();
        Ok(hash)
    }

    fn verify(&self, password: &str, password_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(password_hash) else {
            warn!("Stored password hash is not a valid PHC string");
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

pub fn verify_password(scheme: &dyn PasswordScheme, user: &UserRecord, candidate: &str) -> bool {
    scheme.verify(candidate, &user.password_hash)
}

/// Usernames are compared and stored lowercase.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// `acting` is the user whose own record must not count as a clash.
pub fn ensure_unique_username<S: CredentialStore>(
    store: &S,
    username: &str,
    acting: Option<Uuid>,
) -> CoreResult<()> {
    match store.user_by_username(&normalize_username(username))? {
        Some(existing) if Some(existing.id) != acting => {
            Err(CoreError::Conflict("username already exists".into()))
        }
        _ => Ok(()),
    }
}

pub fn ensure_unique_email<S: CredentialStore>(
    store: &S,
    email: &str,
    acting: Option<Uuid>,
) -> CoreResult<()> {
    match store.user_by_email(email.trim())? {
        Some(existing) if Some(existing.id) != acting => {
            Err(CoreError::Conflict("email already exists".into()))
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub avatar: String,
    pub cover_image: Option<String>,
}

pub fn register<S: CredentialStore>(
    store: &S,
    scheme: &dyn PasswordScheme,
    registration: &Registration,
) -> CoreResult<UserRecord> {
    let username = normalize_username(require_field(&registration.username, "username")?);
    let email = require_field(&registration.email, "email")?.to_string();
    let full_name = require_field(&registration.full_name, "full name")?.to_string();
    let avatar = require_field(&registration.avatar, "avatar")?.to_string();
    // Checked trimmed, hashed as typed.
    require_field(&registration.password, "password")?;

    ensure_unique_username(store, &username, None)?;
    ensure_unique_email(store, &email, None)?;

    let password_hash = scheme
        .hash(&registration.password)
        .map_err(CoreError::Internal)?;

    let user = UserRecord {
        id: Uuid::new_v4(),
        username,
        email,
        full_name,
        avatar,
        cover_image: non_blank(registration.cover_image.as_deref()).map(str::to_string),
        password_hash,
        refresh_token: None,
        created_at: Utc::now(),
    };

    // The unique indexes still catch a registration racing this one.
    store.insert_user(&user)?;

    info!("Registered user {} ({})", user.username, user.id);
    Ok(user)
}

/// Who is logging in: by email, or by username when no email is given.
#[derive(Debug, Clone, Copy)]
pub enum LoginName<'a> {
    Email(&'a str),
    Username(&'a str),
}

/// Check a password and open a session. Unknown accounts and wrong
/// passwords are indistinguishable to the caller, and neither issues a token.
pub fn login<S: CredentialStore>(
    store: &S,
    scheme: &dyn PasswordScheme,
    tokens: &TokenService,
    name: LoginName<'_>,
    password: &str,
) -> CoreResult<(PublicUser, TokenPair)> {
    let user = match name {
        LoginName::Email(email) => store.user_by_email(require_field(email, "email")?)?,
        LoginName::Username(username) => {
            store.user_by_username(&normalize_username(require_field(username, "username")?))?
        }
    };

    let Some(user) = user else {
        return Err(AuthFailure::InvalidCredentials.into());
    };

    if !verify_password(scheme, &user, password) {
        warn!("Failed login for user {}", user.id);
        return Err(AuthFailure::InvalidCredentials.into());
    }

    let pair = tokens.issue_pair(store, user.id)?;
    Ok((user.project(), pair))
}

/// Replace the password after proving knowledge of the current one.
///
/// A new password equal to the old one is rejected before the store is
/// touched. Success also clears the refresh slot, ending other sessions.
pub fn change_password<S: CredentialStore>(
    store: &S,
    scheme: &dyn PasswordScheme,
    user_id: Uuid,
    old_password: &str,
    new_password: &str,
) -> CoreResult<()> {
    if old_password.trim().is_empty() || new_password.trim().is_empty() {
        return Err(CoreError::Validation("old and new password are required".into()));
    }
    if old_password == new_password {
        return Err(CoreError::Validation(
            "new password must differ from the current password".into(),
        ));
    }

    let user = store.user_by_id(user_id)?.ok_or(CoreError::NotFound("user"))?;

    if !verify_password(scheme, &user, old_password) {
        return Err(AuthFailure::InvalidCredentials.into());
    }

    let password_hash = scheme.hash(new_password).map_err(CoreError::Internal)?;
    store.set_password_hash(user.id, &password_hash)?;
    store.set_refresh_fingerprint(user.id, None)?;

    info!("Password changed for user {}", user.id);
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
}

/// Apply non-blank fields to the caller's own account.
pub fn update_account<S: CredentialStore>(
    store: &S,
    user_id: Uuid,
    changes: &AccountChanges,
) -> CoreResult<PublicUser> {
    let update = ProfileUpdate {
        full_name: non_blank(changes.full_name.as_deref()).map(str::to_string),
        email: non_blank(changes.email.as_deref()).map(str::to_string),
        avatar: non_blank(changes.avatar.as_deref()).map(str::to_string),
        cover_image: non_blank(changes.cover_image.as_deref()).map(str::to_string),
    };
    if update.is_empty() {
        return Err(CoreError::Validation("at least one field is required".into()));
    }

    let user = store.user_by_id(user_id)?.ok_or(CoreError::NotFound("user"))?;

    if let Some(email) = &update.email {
        ensure_unique_email(store, email, Some(user.id))?;
    }

    store.update_profile(user.id, &update)?;

    let updated = store.user_by_id(user.id)?.ok_or(CoreError::NotFound("user"))?;
    Ok(updated.project())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStore, PlainScheme, sample_user, token_service};

    fn registration(username: &str, email: &str) -> Registration {
        Registration {
            username: username.into(),
            email: email.into(),
            full_name: "Some One".into(),
            password: "hunter22".into(),
            avatar: "/media/avatar".into(),
            cover_image: Some("   ".into()),
        }
    }

    #[test]
    fn argon2_scheme_verifies_only_the_right_password() {
        let scheme = Argon2Scheme;
        let hash = scheme.hash("correct horse").unwrap();

        assert!(scheme.verify("correct horse", &hash));
        assert!(!scheme.verify("wrong horse", &hash));
        assert!(!scheme.verify("correct horse", "not-a-phc-string"));
    }

    #[test]
    fn register_normalizes_username_and_drops_blank_cover() {
        let store = MemoryStore::default();
        let user = register(&store, &PlainScheme, &registration("  Alice ", "a@example.com")).unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(user.cover_image, None);
        assert_ne!(user.password_hash, "hunter22");
    }

    #[test]
    fn register_rejects_case_insensitive_duplicate_username() {
        let store = MemoryStore::default();
        register(&store, &PlainScheme, &registration("alice", "a@example.com")).unwrap();

        let err = register(&store, &PlainScheme, &registration("ALICE", "b@example.com")).unwrap_err();
        assert!(matches!(err, CoreError::Conflict(msg) if msg.contains("username")));
    }

    #[test]
    fn register_rejects_duplicate_email() {
        let store = MemoryStore::default();
        register(&store, &PlainScheme, &registration("alice", "a@example.com")).unwrap();

        let err = register(&store, &PlainScheme, &registration("bob", "a@example.com")).unwrap_err();
        assert!(matches!(err, CoreError::Conflict(msg) if msg.contains("email")));
    }

    #[test]
    fn register_requires_fields() {
        let store = MemoryStore::default();
        let mut reg = registration("alice", "a@example.com");
        reg.avatar = " ".into();

        let err = register(&store, &PlainScheme, &reg).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn register_rejects_whitespace_password_but_hashes_as_typed() {
        let store = MemoryStore::default();
        let mut reg = registration("alice", "a@example.com");
        reg.password = "   ".into();

        let err = register(&store, &PlainScheme, &reg).unwrap_err();
        assert!(matches!(err, CoreError::Validation(msg) if msg == "password is required"));
        assert!(store.user_by_username("alice").unwrap().is_none());

        reg.password = " padded pass ".into();
        let user = register(&store, &PlainScheme, &reg).unwrap();
        assert_eq!(user.password_hash, "plain$ padded pass ");
    }

    #[test]
    fn change_password_rejects_whitespace_passwords() {
        let store = MemoryStore::default();
        let user = register(&store, &PlainScheme, &registration("alice", "a@example.com")).unwrap();
        let writes_before = store.write_count();

        let err = change_password(&store, &PlainScheme, user.id, "   ", "\t").unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        let err = change_password(&store, &PlainScheme, user.id, "hunter22", " \n ").unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        assert_eq!(store.write_count(), writes_before);
        let stored = store.user_by_id(user.id).unwrap().unwrap();
        assert_eq!(stored.password_hash, "plain$hunter22");
    }

    #[test]
    fn login_with_wrong_password_issues_nothing() {
        let store = MemoryStore::default();
        let tokens = token_service();
        let user = register(&store, &PlainScheme, &registration("alice", "a@example.com")).unwrap();

        let err = login(&store, &PlainScheme, &tokens, LoginName::Email("a@example.com"), "nope").unwrap_err();
        assert_eq!(err.auth_failure(), Some(AuthFailure::InvalidCredentials));

        let stored = store.user_by_id(user.id).unwrap().unwrap();
        assert!(stored.refresh_token.is_none());
    }

    #[test]
    fn login_unknown_account_looks_like_bad_password() {
        let store = MemoryStore::default();
        let tokens = token_service();

        let err = login(&store, &PlainScheme, &tokens, LoginName::Username("ghost"), "x").unwrap_err();
        assert_eq!(err.auth_failure(), Some(AuthFailure::InvalidCredentials));
    }

    #[test]
    fn login_by_username_is_case_insensitive() {
        let store = MemoryStore::default();
        let tokens = token_service();
        register(&store, &PlainScheme, &registration("alice", "a@example.com")).unwrap();

        let (user, pair) =
            login(&store, &PlainScheme, &tokens, LoginName::Username("Alice"), "hunter22").unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(tokens.verify_access_token(&pair.access_token).unwrap().sub, user.id);
    }

    #[test]
    fn change_password_to_same_value_writes_nothing() {
        let store = MemoryStore::default();
        let user = register(&store, &PlainScheme, &registration("alice", "a@example.com")).unwrap();
        let writes_before = store.write_count();

        let err = change_password(&store, &PlainScheme, user.id, "hunter22", "hunter22").unwrap_err();

        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(store.write_count(), writes_before);
    }

    #[test]
    fn change_password_requires_current_password() {
        let store = MemoryStore::default();
        let user = register(&store, &PlainScheme, &registration("alice", "a@example.com")).unwrap();

        let err = change_password(&store, &PlainScheme, user.id, "guess", "newpass1").unwrap_err();
        assert_eq!(err.auth_failure(), Some(AuthFailure::InvalidCredentials));
    }

    #[test]
    fn change_password_replaces_hash_and_ends_sessions() {
        let store = MemoryStore::default();
        let tokens = token_service();
        let user = register(&store, &PlainScheme, &registration("alice", "a@example.com")).unwrap();
        let refresh = tokens.issue_refresh_token(&store, user.id).unwrap();

        change_password(&store, &PlainScheme, user.id, "hunter22", "newpass1").unwrap();

        let stored = store.user_by_id(user.id).unwrap().unwrap();
        assert!(PlainScheme.verify("newpass1", &stored.password_hash));
        let err = tokens.rotate_refresh_token(&store, &refresh).unwrap_err();
        assert_eq!(err.auth_failure(), Some(AuthFailure::Revoked));
    }

    #[test]
    fn update_account_allows_keeping_own_email() {
        let store = MemoryStore::default();
        let alice = sample_user(&store, "alice");

        let updated = update_account(
            &store,
            alice.id,
            &AccountChanges {
                full_name: Some("Alice A.".into()),
                email: Some(alice.email.clone()),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(updated.full_name, "Alice A.");
    }

    #[test]
    fn update_account_rejects_someone_elses_email() {
        let store = MemoryStore::default();
        let alice = sample_user(&store, "alice");
        let bob = sample_user(&store, "bob");

        let err = update_account(
            &store,
            alice.id,
            &AccountChanges {
                email: Some(bob.email.clone()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[test]
    fn update_account_needs_a_field() {
        let store = MemoryStore::default();
        let alice = sample_user(&store, "alice");

        let err = update_account(
            &store,
            alice.id,
            &AccountChanges {
                full_name: Some(" ".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
