//! Who the pipeline is acting for, and the credential attached to remote calls.

use crate::error::ProfileError;
use crate::remote::HttpAuthClient;
use crate::storage::{self, LocalCache, SESSION_KEY};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn user_id(&self) -> Result<Option<String>, ProfileError>;

    async fn credential(&self) -> Result<Credential, ProfileError>;
}

/// Bearer credential for remote calls. Anonymous credentials send no header.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    token: Option<String>,
}

impl Credential {
    pub fn bearer(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            token: Some(token).filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_anonymous(&self) -> bool {
        self.token.is_none()
    }

    pub fn authorization(&self) -> Option<String> {
        self.token.as_deref().map(|t| format!("Bearer {t}"))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token {
            Some(_) => f.write_str("Credential(Bearer <redacted>)"),
            None => f.write_str("Credential(anonymous)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub token: String,
    pub user_id: String,
    pub email: String,
    pub username: String,
    pub login_time: DateTime<Utc>,
}

/// Session persisted as one record in the local cache.
#[derive(Clone)]
pub struct CachedSessionStore {
    cache: Arc<dyn LocalCache>,
}

impl CachedSessionStore {
    pub fn new(cache: Arc<dyn LocalCache>) -> Self {
        Self { cache }
    }

    pub async fn session(&self) -> Result<Option<UserSession>, ProfileError> {
        storage::get_json(self.cache.as_ref(), SESSION_KEY)
            .await
            .map_err(ProfileError::cache)
    }

    pub async fn save(&self, session: &UserSession) -> Result<(), ProfileError> {
        storage::set_json(self.cache.as_ref(), SESSION_KEY, session)
            .await
            .map_err(ProfileError::cache)
    }

    pub async fn clear(&self) -> Result<(), ProfileError> {
        self.cache
            .remove(SESSION_KEY)
            .await
            .map_err(ProfileError::cache)
    }

    pub async fn is_authenticated(&self) -> Result<bool, ProfileError> {
        Ok(self.session().await?.is_some())
    }

    /// Logs in against the auth service and persists the resulting session.
    pub async fn login(
        &self,
        auth: &HttpAuthClient,
        email: &str,
        password: &str,
    ) -> Result<UserSession, ProfileError> {
        let response = auth.login(email, password).await?;
        let session = UserSession {
            token: response.auth.access_token,
            user_id: response.user.id,
            email: response.user.email,
            username: response.user.username,
            login_time: Utc::now(),
        };
        self.save(&session).await?;
        tracing::info!(user_id = %session.user_id, "session stored");
        Ok(session)
    }
}

#[async_trait::async_trait]
impl SessionStore for CachedSessionStore {
    async fn user_id(&self) -> Result<Option<String>, ProfileError> {
        Ok(self
            .session()
            .await?
            .map(|s| s.user_id)
            .filter(|id| !id.trim().is_empty()))
    }

    async fn credential(&self) -> Result<Credential, ProfileError> {
        Ok(self
            .session()
            .await?
            .map(|s| Credential::bearer(s.token))
            .unwrap_or_default())
    }
}

/// A fixed identity, for embedding the pipeline behind another auth layer.
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
    user_id: Option<String>,
    credential: Credential,
}

impl StaticSession {
    pub fn authenticated(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            credential: Credential::bearer(token),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SessionStore for StaticSession {
    async fn user_id(&self) -> Result<Option<String>, ProfileError> {
        Ok(self.user_id.clone())
    }

    async fn credential(&self) -> Result<Credential, ProfileError> {
        Ok(self.credential.clone())
    }
}
