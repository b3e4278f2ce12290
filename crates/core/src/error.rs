use crate::domain::profile::PipelineStage;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the profile pipeline to its caller.
///
/// Every variant is terminal for the operation that produced it: nothing in the
/// pipeline retries on its own, and a failed stage leaves the cache as it was.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("user is not authenticated")]
    Unauthenticated,

    #[error("{stage} requires a cached {missing}; run that stage first")]
    MissingPrecondition {
        stage: PipelineStage,
        missing: &'static str,
    },

    #[error("invalid questionnaire submission: {0}")]
    InvalidSubmission(String),

    #[error("upstream returned HTTP {status_code}: {message}")]
    Upstream { status_code: u16, message: String },

    #[error("upstream did not respond within {}s", .timeout.as_secs())]
    UpstreamTimeout { timeout: Duration },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("cache error: {0}")]
    Cache(String),
}

impl ProfileError {
    /// Stable machine-readable tag for the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::MissingPrecondition { .. } => "missing_precondition",
            Self::InvalidSubmission(_) => "invalid_submission",
            Self::Upstream { .. } => "upstream_error",
            Self::UpstreamTimeout { .. } => "upstream_timeout",
            Self::Transport(_) => "transport_error",
            Self::Cache(_) => "cache_error",
        }
    }

    pub(crate) fn cache(err: anyhow::Error) -> Self {
        Self::Cache(format!("{err:#}"))
    }
}
