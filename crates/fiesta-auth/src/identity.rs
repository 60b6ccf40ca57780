//! Identity provider backed by the key/value cache.
//!
//! Users live under `user:<id>`; the session of one browsing session lives
//! under `auth:<session id>`. Signing in needs only a registered email,
//! which makes this provider a local stand-in for the hosted identity
//! service.

use async_trait::async_trait;
use fiesta_cache::{cache_key, Cache, SessionId};
use fiesta_commerce::ids::UserId;
use fiesta_commerce::ports::{BackendResult, IdentityProvider};

use crate::session::AuthSession;
use crate::user::{normalize_email, Role, User};
use crate::AuthError;

const USER_PREFIX: &str = "user";
const AUTH_PREFIX: &str = "auth";

/// Registered users and the signed-in user of one browsing session.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    cache: Cache,
    session_id: SessionId,
}

impl SessionIdentity {
    pub fn new(cache: Cache, session_id: SessionId) -> Self {
        Self { cache, session_id }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Add a user to the directory.
    #[tracing::instrument(skip_all, fields(email = %user.email))]
    pub fn register(&self, user: User) -> Result<User, AuthError> {
        if self.find_by_email(&user.email)?.is_some() {
            return Err(AuthError::UserAlreadyExists(user.email));
        }
        self.cache.set(&cache_key!(USER_PREFIX, user.id), &user)?;
        tracing::info!(user = %user.id, role = %user.role, "user registered");
        Ok(user)
    }

    /// Change a registered user's role.
    pub fn set_role(&self, email: &str, role: Role) -> Result<User, AuthError> {
        let user = self
            .find_by_email(email)?
            .ok_or_else(|| AuthError::UserNotFound(email.to_string()))?
            .with_role(role);
        self.cache.set(&cache_key!(USER_PREFIX, user.id), &user)?;
        Ok(user)
    }

    pub fn find_user(&self, id: &UserId) -> Result<Option<User>, AuthError> {
        Ok(self.cache.get(&cache_key!(USER_PREFIX, id))?)
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let email = normalize_email(email)?;
        for key in self.cache.keys_with_prefix(&format!("{USER_PREFIX}:"))? {
            if let Some(user) = self.cache.get::<User>(&key)? {
                if user.email == email {
                    return Ok(Some(user));
                }
            }
        }
        Ok(None)
    }

    /// Sign a registered user in for this browsing session.
    #[tracing::instrument(skip_all)]
    pub fn sign_in(&self, email: &str) -> Result<AuthSession, AuthError> {
        let user = self
            .find_by_email(email)?
            .ok_or(AuthError::InvalidCredentials)?;
        let session = AuthSession::new(user);
        self.save_session(&session)?;
        tracing::info!(user = %session.user.id, "signed in");
        Ok(session)
    }

    /// Store a session, e.g. one issued by the hosted identity service.
    pub fn save_session(&self, session: &AuthSession) -> Result<(), AuthError> {
        self.cache.set(&self.auth_key(), session)?;
        Ok(())
    }

    /// The stored session, if it has not expired. Expired sessions are removed.
    pub fn current_session(&self) -> Result<Option<AuthSession>, AuthError> {
        let Some(session) = self.cache.get::<AuthSession>(&self.auth_key())? else {
            return Ok(None);
        };
        if session.is_expired() {
            tracing::info!(user = %session.user.id, "session expired");
            self.cache.delete(&self.auth_key())?;
            return Ok(None);
        }
        Ok(Some(session))
    }

    /// Remove this browsing session's sign-in.
    pub fn end_session(&self) -> Result<(), AuthError> {
        self.cache.delete(&self.auth_key())?;
        Ok(())
    }

    fn auth_key(&self) -> String {
        cache_key!(AUTH_PREFIX, self.session_id)
    }
}

#[async_trait]
impl IdentityProvider for SessionIdentity {
    async fn current_user(&self) -> BackendResult<Option<UserId>> {
        Ok(self.current_session()?.map(|s| s.user.id))
    }

    async fn is_privileged(&self, user: &UserId) -> BackendResult<bool> {
        Ok(self.find_user(user)?.is_some_and(|u| u.is_admin()))
    }

    async fn sign_out(&self) -> BackendResult<()> {
        self.end_session()?;
        tracing::info!("signed out");
        Ok(())
    }
}
