//! Sequences the questionnaire → analysis → recommendation pipeline over the local cache.
//!
//! Each stage reads its input record, makes at most one remote call and then
//! replaces its own record. Records further down the chain are removed only
//! after that write succeeds, so a failed stage leaves the cache as it was.
//! If a removal fails after the write, the leftover record still names the
//! `submissionId` / `classificationId` it was built from and no longer matches.

use crate::domain::profile::{PipelineStage, ProfileClassification, ProfileStatus};
use crate::domain::questionnaire::QuestionnaireSubmission;
use crate::domain::recommendation::RecommendationSet;
use crate::error::ProfileError;
use crate::remote::recommender::DEFAULT_TIMEOUT;
use crate::remote::{RecommendationClient, ScoringClient};
use crate::session::SessionStore;
use crate::storage::{
    self, LocalCache, ANALYSIS_KEY, PROFILE_KEYS, QUESTIONNAIRE_KEY, RECOMMENDATIONS_KEY,
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub struct ProfileOrchestrator {
    session: Arc<dyn SessionStore>,
    cache: Arc<dyn LocalCache>,
    scoring: Arc<dyn ScoringClient>,
    recommender: Arc<dyn RecommendationClient>,
    recommendation_timeout: Duration,
}

/// Every record produced by one full pass through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRun {
    pub submission: QuestionnaireSubmission,
    pub classification: ProfileClassification,
    pub recommendations: RecommendationSet,
}

impl ProfileOrchestrator {
    pub fn new(
        session: Arc<dyn SessionStore>,
        cache: Arc<dyn LocalCache>,
        scoring: Arc<dyn ScoringClient>,
        recommender: Arc<dyn RecommendationClient>,
    ) -> Self {
        Self {
            session,
            cache,
            scoring,
            recommender,
            recommendation_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_recommendation_timeout(mut self, timeout: Duration) -> Self {
        self.recommendation_timeout = timeout;
        self
    }

    pub fn recommendation_timeout(&self) -> Duration {
        self.recommendation_timeout
    }

    /// Records a questionnaire run for the signed-in user, replacing any earlier one.
    ///
    /// The previous analysis and recommendations belong to the replaced run and
    /// are removed once the new submission is stored.
    pub async fn save_submission(
        &self,
        answers: BTreeMap<String, String>,
        monthly_investment_value: f64,
    ) -> Result<QuestionnaireSubmission, ProfileError> {
        let user_id = self
            .session
            .user_id()
            .await?
            .ok_or(ProfileError::Unauthenticated)?;

        let submission =
            QuestionnaireSubmission::new(user_id, answers, monthly_investment_value, Utc::now())?;

        self.write(QUESTIONNAIRE_KEY, &submission).await?;
        self.invalidate(&[RECOMMENDATIONS_KEY, ANALYSIS_KEY]).await;

        tracing::info!(
            submission_id = %submission.id,
            user_id = %submission.user_id,
            answers = submission.answers.len(),
            "questionnaire submission saved"
        );
        Ok(submission)
    }

    /// Sends the cached submission to the scoring service and caches the verdict.
    pub async fn analyze_profile(&self) -> Result<ProfileClassification, ProfileError> {
        let submission: QuestionnaireSubmission =
            self.read(QUESTIONNAIRE_KEY).await?.ok_or(ProfileError::MissingPrecondition {
                stage: PipelineStage::Analysis,
                missing: "questionnaire submission",
            })?;

        let credential = self.session.credential().await?;
        let request = submission.to_request();

        let t0 = Instant::now();
        let analysis = match self.scoring.analyze_profile(&credential, &request).await {
            Ok(analysis) => analysis,
            Err(err) => {
                tracing::warn!(
                    submission_id = %submission.id,
                    kind = err.kind(),
                    error = %err,
                    "profile analysis failed; cache left unchanged"
                );
                return Err(err);
            }
        };

        let classification = ProfileClassification {
            id: Uuid::new_v4(),
            submission_id: submission.id,
            analysis,
            analyzed_at: Utc::now(),
        };

        self.write(ANALYSIS_KEY, &classification).await?;
        self.invalidate(&[RECOMMENDATIONS_KEY]).await;

        tracing::info!(
            submission_id = %submission.id,
            classification_id = %classification.id,
            classification = classification.classification(),
            total_score = classification.analysis.total_score,
            elapsed_ms = t0.elapsed().as_millis(),
            "profile analyzed"
        );
        Ok(classification)
    }

    /// Asks the recommender for instruments matching the cached classification.
    pub async fn load_recommendations(&self) -> Result<RecommendationSet, ProfileError> {
        let classification: ProfileClassification =
            self.read(ANALYSIS_KEY).await?.ok_or(ProfileError::MissingPrecondition {
                stage: PipelineStage::Recommendation,
                missing: "profile analysis",
            })?;

        let submission: Option<QuestionnaireSubmission> = self.read(QUESTIONNAIRE_KEY).await?;
        if submission.map(|s| s.id) != Some(classification.submission_id) {
            tracing::warn!(
                classification_id = %classification.id,
                submission_id = %classification.submission_id,
                "cached analysis belongs to a replaced submission"
            );
            return Err(ProfileError::MissingPrecondition {
                stage: PipelineStage::Recommendation,
                missing: "profile analysis of the current submission",
            });
        }

        let credential = self.session.credential().await?;

        let t0 = Instant::now();
        let response = match self
            .recommender
            .recommend(
                &credential,
                &classification.analysis,
                self.recommendation_timeout,
            )
            .await
        {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(
                    classification_id = %classification.id,
                    kind = err.kind(),
                    error = %err,
                    "loading recommendations failed; cache left unchanged"
                );
                return Err(err);
            }
        };

        let recommendations = RecommendationSet {
            classification_id: classification.id,
            fixed_income_items: response.fixed_incomes,
            variable_income_items: response.variable_incomes,
            loaded_at: Utc::now(),
        };
        self.write(RECOMMENDATIONS_KEY, &recommendations).await?;

        tracing::info!(
            classification_id = %classification.id,
            fixed_income = recommendations.fixed_income_items.len(),
            variable_income = recommendations.variable_income_items.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "recommendations loaded"
        );
        Ok(recommendations)
    }

    /// Presence of each record, checked independently.
    pub async fn status(&self) -> Result<ProfileStatus, ProfileError> {
        let cache = self.cache.as_ref();
        let has = |key: &'static str| async move {
            storage::contains(cache, key)
                .await
                .map_err(ProfileError::cache)
        };

        Ok(ProfileStatus {
            has_questionnaire: has(QUESTIONNAIRE_KEY).await?,
            has_analysis: has(ANALYSIS_KEY).await?,
            has_recommendations: has(RECOMMENDATIONS_KEY).await?,
        })
    }

    /// Drops all three records. Every deletion is attempted; the first failure is returned.
    pub async fn clear_all(&self) -> Result<(), ProfileError> {
        let res = self.cache.remove_many(&PROFILE_KEYS).await;
        match &res {
            Ok(()) => tracing::info!("profile records cleared"),
            Err(err) => tracing::error!(error = %err, "clearing profile records partially failed"),
        }
        res.map_err(ProfileError::cache)
    }

    pub async fn questionnaire(&self) -> Result<Option<QuestionnaireSubmission>, ProfileError> {
        self.read(QUESTIONNAIRE_KEY).await
    }

    pub async fn classification(&self) -> Result<Option<ProfileClassification>, ProfileError> {
        self.read(ANALYSIS_KEY).await
    }

    pub async fn recommendations(&self) -> Result<Option<RecommendationSet>, ProfileError> {
        self.read(RECOMMENDATIONS_KEY).await
    }

    /// Save, analyze and recommend in one go, stopping at the first failed stage.
    pub async fn run_pipeline(
        &self,
        answers: BTreeMap<String, String>,
        monthly_investment_value: f64,
    ) -> Result<PipelineRun, ProfileError> {
        let submission = self
            .save_submission(answers, monthly_investment_value)
            .await?;
        let classification = self.analyze_profile().await?;
        let recommendations = self.load_recommendations().await?;

        Ok(PipelineRun {
            submission,
            classification,
            recommendations,
        })
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ProfileError> {
        storage::get_json(self.cache.as_ref(), key)
            .await
            .map_err(ProfileError::cache)
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ProfileError> {
        storage::set_json(self.cache.as_ref(), key, value)
            .await
            .map_err(ProfileError::cache)
    }

    // Runs after the new record is stored, so a failure here is logged and
    // the stale record is left for the chain ids to expose.
    async fn invalidate(&self, keys: &[&str]) {
        if let Err(err) = self.cache.remove_many(keys).await {
            tracing::warn!(error = %err, ?keys, "stale downstream records could not be removed");
        }
    }
}
