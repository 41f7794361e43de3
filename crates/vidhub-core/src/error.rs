use thiserror::Error;

pub type CoreResult<T> = std::result::Result<T, CoreError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Every outcome a core operation can report besides success.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthFailure),

    #[error("Not permitted to modify this resource")]
    Authorization,

    #[error("Internal error: {0}")]
    Internal(anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("missing credential")]
    MissingCredential,

    #[error("token expired")]
    Expired,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token revoked")]
    Revoked,

    #[error("user not found")]
    UserNotFound,

    #[error("invalid credentials")]
    InvalidCredentials,
}

/// Failure reported by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("unique constraint violated")]
    Conflict,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => CoreError::Conflict("record already exists".into()),
            StoreError::Backend(e) => CoreError::Internal(e),
        }
    }
}

impl CoreError {
    pub fn auth_failure(&self) -> Option<AuthFailure> {
        match self {
            CoreError::Auth(failure) => Some(*failure),
            _ => None,
        }
    }
}

/// Trim `value` and reject it when nothing is left.
pub fn require_field<'a>(value: &'a str, name: &str) -> CoreResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{} is required", name)));
    }
    Ok(trimmed)
}

/// `Some` only when the optional field carries non-blank text.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
