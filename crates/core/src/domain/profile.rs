use crate::domain::contract::AnalyzeProfileResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The scoring service's verdict for one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileClassification {
    pub id: Uuid,
    pub submission_id: Uuid,
    #[serde(flatten)]
    pub analysis: AnalyzeProfileResponse,
    pub analyzed_at: DateTime<Utc>,
}

impl ProfileClassification {
    pub fn classification(&self) -> &str {
        &self.analysis.profile_classification
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Analysis,
    Recommendation,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Analysis => "analysis",
            Self::Recommendation => "recommendation",
        };
        f.write_str(name)
    }
}

/// How far the cached pipeline has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Empty,
    HasSubmission,
    HasClassification,
    HasRecommendations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStatus {
    pub has_questionnaire: bool,
    pub has_analysis: bool,
    pub has_recommendations: bool,
}

impl ProfileStatus {
    /// The furthest stage reachable through an unbroken chain of cached records.
    pub fn stage(&self) -> PipelineState {
        match (
            self.has_questionnaire,
            self.has_analysis,
            self.has_recommendations,
        ) {
            (false, _, _) => PipelineState::Empty,
            (true, false, _) => PipelineState::HasSubmission,
            (true, true, false) => PipelineState::HasClassification,
            (true, true, true) => PipelineState::HasRecommendations,
        }
    }
}
