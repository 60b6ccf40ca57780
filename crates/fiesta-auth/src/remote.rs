//! Identity provider for the hosted auth service.

use async_trait::async_trait;
use fiesta_commerce::ids::UserId;
use fiesta_commerce::ports::{BackendError, BackendResult, IdentityProvider};
use fiesta_data::{ClientRequestBuilder, FetchClient, FetchError};
use serde::Deserialize;
use std::sync::{Mutex, PoisonError};

use crate::session::AuthSession;
use crate::user::{Role, User};
use crate::AuthError;

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: UserId,
    #[serde(default)]
    email: Option<String>,
}

impl From<RemoteUser> for User {
    fn from(remote: RemoteUser) -> Self {
        User {
            id: remote.id,
            email: remote.email.unwrap_or_default(),
            name: None,
            role: Role::Customer,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    user: RemoteUser,
}

/// Talks to `/auth/v1` for the user and to the `is_admin` procedure for privilege.
#[derive(Debug)]
pub struct RemoteIdentity {
    client: FetchClient,
    api_key: String,
    access_token: Mutex<Option<String>>,
}

impl RemoteIdentity {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        Self {
            client: FetchClient::new()
                .with_base_url(base_url)
                .with_default_header("apikey", api_key.clone()),
            api_key,
            access_token: Mutex::new(None),
        }
    }

    /// Resume a session whose token was stored earlier.
    pub fn with_access_token(self, token: impl Into<String>) -> Self {
        *self.token_slot() = Some(token.into());
        self
    }

    /// Exchange an email and password for a session.
    #[tracing::instrument(skip_all)]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let request = self
            .client
            .post("/auth/v1/token")
            .query("grant_type", "password")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .map_err(BackendError::from)?;

        let response = match self.authorize(request, None).send().await {
            Ok(response) => response,
            Err(e) => return Err(AuthError::Remote(e.into())),
        };
        if response.is_client_error() {
            return Err(AuthError::InvalidCredentials);
        }
        let token: TokenResponse = response
            .error_for_status()
            .and_then(|r| r.json())
            .map_err(BackendError::from)?;

        let mut session = AuthSession::with_token(token.user.into(), token.access_token);
        if let Some(secs) = token.expires_in {
            session = session.with_duration(chrono::Duration::seconds(secs));
        }
        *self.token_slot() = Some(session.access_token.clone());
        tracing::info!(user = %session.user.id, "signed in");
        Ok(session)
    }

    fn token_slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.access_token.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn authorize(&self, request: ClientRequestBuilder, token: Option<&str>) -> ClientRequestBuilder {
        request.bearer_auth(token.unwrap_or(&self.api_key))
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentity {
    async fn current_user(&self) -> BackendResult<Option<UserId>> {
        let Some(token) = self.token_slot().clone() else {
            return Ok(None);
        };
        let response = self
            .authorize(self.client.get("/auth/v1/user"), Some(&token))
            .send()
            .await?;
        if matches!(response.status, 401 | 403) {
            tracing::info!("stored token no longer accepted");
            return Ok(None);
        }
        let user: RemoteUser = response.error_for_status()?.json()?;
        Ok(Some(user.id))
    }

    async fn is_privileged(&self, user: &UserId) -> BackendResult<bool> {
        let token = self.token_slot().clone();
        let request = self
            .client
            .post("/rest/v1/rpc/is_admin")
            .json(&serde_json::json!({ "user_id": user }))
            .map_err(|e: FetchError| BackendError::InvalidResponse(e.to_string()))?;
        let response = self
            .authorize(request, token.as_deref())
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<bool>()?)
    }

    async fn sign_out(&self) -> BackendResult<()> {
        let Some(token) = self.token_slot().take() else {
            return Ok(());
        };
        self.authorize(self.client.post("/auth/v1/logout"), Some(&token))
            .send()
            .await?
            .error_for_status()?;
        tracing::info!("signed out");
        Ok(())
    }
}
