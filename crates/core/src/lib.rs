pub mod context;
pub mod domain;
pub mod error;
pub mod orchestrator;
pub mod remote;
pub mod session;
pub mod storage;

pub use error::ProfileError;
pub use orchestrator::ProfileOrchestrator;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    const DEFAULT_CACHE_DATABASE_URL: &str = "sqlite://invest_profile.db";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub profile_api_base_url: Option<String>,
        pub recommender_api_base_url: Option<String>,
        pub auth_api_base_url: Option<String>,
        pub cache_database_url: String,
        pub recommender_timeout: Duration,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let recommender_timeout = match std::env::var("RECOMMENDER_TIMEOUT_SECS") {
                Ok(s) => Duration::from_secs(
                    s.parse::<u64>()
                        .with_context(|| format!("RECOMMENDER_TIMEOUT_SECS is not a number: {s}"))?,
                ),
                Err(_) => crate::remote::recommender::DEFAULT_TIMEOUT,
            };

            Ok(Self {
                profile_api_base_url: std::env::var("PROFILE_API_BASE_URL").ok(),
                recommender_api_base_url: std::env::var("RECOMMENDER_API_BASE_URL").ok(),
                auth_api_base_url: std::env::var("AUTH_API_BASE_URL").ok(),
                cache_database_url: std::env::var("CACHE_DATABASE_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_CACHE_DATABASE_URL.to_string()),
                recommender_timeout,
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        pub fn require_profile_api_base_url(&self) -> anyhow::Result<&str> {
            self.profile_api_base_url
                .as_deref()
                .context("PROFILE_API_BASE_URL is required")
        }

        pub fn require_recommender_api_base_url(&self) -> anyhow::Result<&str> {
            self.recommender_api_base_url
                .as_deref()
                .context("RECOMMENDER_API_BASE_URL is required")
        }

        pub fn require_auth_api_base_url(&self) -> anyhow::Result<&str> {
            self.auth_api_base_url
                .as_deref()
                .context("AUTH_API_BASE_URL is required")
        }
    }
}
