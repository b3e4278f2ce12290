use crate::domain::contract::{AnalyzeProfileRequest, AnalyzeProfileResponse, RecommendationResponse};
use crate::error::ProfileError;
use crate::session::Credential;
use std::time::Duration;

pub mod auth;
mod http;
pub mod recommender;
pub mod scoring;

#[cfg(test)]
pub(crate) mod mock;

pub use auth::HttpAuthClient;
pub use recommender::HttpRecommendationClient;
pub use scoring::HttpScoringClient;

/// Classifies an investor profile from questionnaire answers.
#[async_trait::async_trait]
pub trait ScoringClient: Send + Sync {
    async fn analyze_profile(
        &self,
        credential: &Credential,
        request: &AnalyzeProfileRequest,
    ) -> Result<AnalyzeProfileResponse, ProfileError>;
}

/// Suggests instruments for a classification.
#[async_trait::async_trait]
pub trait RecommendationClient: Send + Sync {
    /// Fails with `UpstreamTimeout` if no full response arrives within `timeout`.
    async fn recommend(
        &self,
        credential: &Credential,
        profile: &AnalyzeProfileResponse,
        timeout: Duration,
    ) -> Result<RecommendationResponse, ProfileError>;
}
