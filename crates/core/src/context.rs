use crate::config::Settings;
use crate::error::ProfileError;
use crate::orchestrator::ProfileOrchestrator;
use crate::remote::{HttpAuthClient, HttpRecommendationClient, HttpScoringClient};
use crate::session::CachedSessionStore;
use crate::storage::{LocalCache, SqliteCache};
use std::sync::Arc;

/// Everything a front end needs, built once from settings and shared.
#[derive(Clone)]
pub struct AppContext {
    pub cache: Arc<dyn LocalCache>,
    pub sessions: Arc<CachedSessionStore>,
    pub auth: Arc<HttpAuthClient>,
    pub orchestrator: Arc<ProfileOrchestrator>,
}

impl AppContext {
    pub async fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let cache: Arc<dyn LocalCache> =
            Arc::new(SqliteCache::connect(&settings.cache_database_url).await?);
        Self::with_cache(settings, cache)
    }

    pub fn with_cache(settings: &Settings, cache: Arc<dyn LocalCache>) -> anyhow::Result<Self> {
        let sessions = Arc::new(CachedSessionStore::new(cache.clone()));
        let scoring = Arc::new(HttpScoringClient::from_settings(settings)?);
        let recommender = Arc::new(HttpRecommendationClient::from_settings(settings)?);
        let auth = Arc::new(HttpAuthClient::from_settings(settings)?);

        let orchestrator = ProfileOrchestrator::new(
            sessions.clone(),
            cache.clone(),
            scoring,
            recommender,
        )
        .with_recommendation_timeout(settings.recommender_timeout);

        Ok(Self {
            cache,
            sessions,
            auth,
            orchestrator: Arc::new(orchestrator),
        })
    }

    /// Ends the session and forgets the profile pipeline with it.
    pub async fn logout(&self) -> Result<(), ProfileError> {
        let session = self.sessions.clear().await;
        let records = self.orchestrator.clear_all().await;
        tracing::info!(
            session_cleared = session.is_ok(),
            records_cleared = records.is_ok(),
            "logout"
        );
        session.and(records)
    }
}
