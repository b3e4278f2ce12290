use crate::config::Settings;
use crate::domain::contract::{AnalyzeProfileRequest, AnalyzeProfileResponse};
use crate::error::ProfileError;
use crate::remote::{http, ScoringClient};
use crate::session::Credential;
use anyhow::Context;
use std::time::Duration;

const ANALYZE_PATH: &str = "/profile/analyze";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct HttpScoringClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpScoringClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build scoring http client")?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let base_url = settings.require_profile_api_base_url()?;
        let timeout_secs = std::env::var("SCORING_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self::new(base_url, Duration::from_secs(timeout_secs))
    }

    fn url(&self) -> String {
        http::join_url(&self.base_url, ANALYZE_PATH)
    }
}

#[async_trait::async_trait]
impl ScoringClient for HttpScoringClient {
    async fn analyze_profile(
        &self,
        credential: &Credential,
        request: &AnalyzeProfileRequest,
    ) -> Result<AnalyzeProfileResponse, ProfileError> {
        let response: AnalyzeProfileResponse =
            http::post_json(&self.http, &self.url(), credential, request).await?;

        response
            .validate(request)
            .map_err(|e| ProfileError::Transport(format!("malformed scoring response: {e:#}")))
    }
}
