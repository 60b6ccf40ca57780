//! Signed-in sessions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::user::User;
use crate::AuthError;

/// A signed-in user and the token that proves it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthSession {
    pub user: User,
    /// Bearer token sent to the hosted backend. Locally generated sessions
    /// carry a random token of their own.
    pub access_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    /// Default session duration: 7 days.
    pub const DEFAULT_DURATION_SECS: i64 = 7 * 24 * 60 * 60;

    /// A session for `user` with a freshly generated token.
    pub fn new(user: User) -> Self {
        Self::with_token(user, generate_token())
    }

    /// A session for `user` around a token issued elsewhere.
    pub fn with_token(user: User, access_token: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user,
            access_token: access_token.into(),
            created_at: now,
            expires_at: now + Duration::seconds(Self::DEFAULT_DURATION_SECS),
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.expires_at = self.created_at + duration;
        self
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    pub fn validate(&self) -> Result<(), AuthError> {
        if self.is_expired() {
            Err(AuthError::SessionExpired)
        } else {
            Ok(())
        }
    }

    /// Seconds until expiry, zero once expired.
    pub fn time_to_expiry(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }
}

/// 24 random bytes, URL-safe base64.
fn generate_token() -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use rand::Rng;

    let bytes: [u8; 24] = rand::thread_rng().gen();
    format!("tok_{}", URL_SAFE_NO_PAD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new("ana@example.com").unwrap()
    }

    #[test]
    fn test_new_session_is_valid() {
        let session = AuthSession::new(user());
        assert!(!session.is_expired());
        assert!(session.validate().is_ok());
        assert!(session.time_to_expiry() > 0);
        assert!(session.access_token.starts_with("tok_"));
    }

    #[test]
    fn test_expired_session() {
        let session = AuthSession::new(user()).with_duration(Duration::seconds(-1));
        assert!(session.is_expired());
        assert!(matches!(session.validate(), Err(AuthError::SessionExpired)));
        assert_eq!(session.time_to_expiry(), 0);
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = AuthSession::new(user());
        let b = AuthSession::new(user());
        assert_ne!(a.access_token, b.access_token);
        assert_eq!(a.access_token.len(), "tok_".len() + 32);
    }
}
