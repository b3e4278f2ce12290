use crate::config::Settings;
use crate::domain::contract::{AnalyzeProfileResponse, RecommendationResponse};
use crate::error::ProfileError;
use crate::remote::{http, RecommendationClient};
use crate::session::Credential;
use anyhow::Context;
use std::time::Duration;

const RECOMMENDER_PATH: &str = "/recommender";

/// The recommender can take a while; callers give up after this long.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct HttpRecommendationClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRecommendationClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        // No client-level timeout: the per-call deadline owns that.
        let http = reqwest::Client::builder()
            .build()
            .context("failed to build recommender http client")?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::new(settings.require_recommender_api_base_url()?)
    }

    fn url(&self) -> String {
        http::join_url(&self.base_url, RECOMMENDER_PATH)
    }
}

#[async_trait::async_trait]
impl RecommendationClient for HttpRecommendationClient {
    async fn recommend(
        &self,
        credential: &Credential,
        profile: &AnalyzeProfileResponse,
        timeout: Duration,
    ) -> Result<RecommendationResponse, ProfileError> {
        let url = self.url();
        let call = http::post_json::<_, RecommendationResponse>(&self.http, &url, credential, profile);

        let response = match tokio::time::timeout(timeout, call).await {
            Ok(res) => res?,
            Err(_) => {
                tracing::warn!(%url, timeout_secs = timeout.as_secs_f64(), "recommender call timed out");
                return Err(ProfileError::UpstreamTimeout { timeout });
            }
        };

        response.validate().map_err(|e| {
            ProfileError::Transport(format!("malformed recommendation response: {e:#}"))
        })
    }
}
