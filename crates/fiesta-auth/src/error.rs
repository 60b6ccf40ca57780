//! Authentication errors.

use fiesta_commerce::ports::BackendError;
use thiserror::Error;

/// Authentication error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Invalid credentials provided.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// User already exists.
    #[error("user already exists: {0}")]
    UserAlreadyExists(String),

    /// The email address is not usable.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// No session is stored for this browsing session.
    #[error("session not found")]
    SessionNotFound,

    /// Session expired.
    #[error("session expired")]
    SessionExpired,

    /// Cache error.
    #[error("cache error: {0}")]
    Cache(#[from] fiesta_cache::CacheError),

    /// The hosted identity service failed.
    #[error("identity service error: {0}")]
    Remote(#[from] BackendError),
}

impl AuthError {
    /// Check if this is an authentication failure.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::UserNotFound(_)
                | AuthError::SessionNotFound
                | AuthError::SessionExpired
        )
    }
}

impl From<AuthError> for BackendError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Remote(inner) => inner,
            AuthError::Cache(e) => BackendError::Storage(e.to_string()),
            other if other.is_auth_failure() => BackendError::Unauthorized,
            other => BackendError::InvalidResponse(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failures_become_unauthorized() {
        let err: BackendError = AuthError::SessionExpired.into();
        assert_eq!(err, BackendError::Unauthorized);

        let err: BackendError = AuthError::Remote(BackendError::Transport("reset".into())).into();
        assert_eq!(err, BackendError::Transport("reset".into()));
    }
}
