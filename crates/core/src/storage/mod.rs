//! Durable key-value records backing the profile pipeline and the session.
//!
//! Values are JSON text and every write replaces the whole record. Nothing here
//! spans keys: callers that touch several records do so one key at a time.

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryCache;
pub use sqlite::SqliteCache;

pub const QUESTIONNAIRE_KEY: &str = "questionnaire_data";
pub const ANALYSIS_KEY: &str = "profile_analysis";
pub const RECOMMENDATIONS_KEY: &str = "recommendations";
pub const SESSION_KEY: &str = "user_session";

/// Pipeline records in dependency order.
pub const PROFILE_KEYS: [&str; 3] = [QUESTIONNAIRE_KEY, ANALYSIS_KEY, RECOMMENDATIONS_KEY];

#[async_trait::async_trait]
pub trait LocalCache: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;

    /// Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> anyhow::Result<()>;

    /// Attempts every key even after a failure and reports the first error.
    async fn remove_many(&self, keys: &[&str]) -> anyhow::Result<()> {
        let mut first_err = None;
        for key in keys {
            if let Err(err) = self.remove(key).await {
                tracing::warn!(key, error = %err, "cache remove failed; continuing");
                if first_err.is_none() {
                    first_err = Some(err);
                }
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

pub async fn get_json<T: DeserializeOwned>(
    cache: &dyn LocalCache,
    key: &str,
) -> anyhow::Result<Option<T>> {
    let Some(raw) = cache.get(key).await? else {
        return Ok(None);
    };
    let value = serde_json::from_str(&raw)
        .with_context(|| format!("cached record {key} is not valid JSON for its type"))?;
    Ok(Some(value))
}

pub async fn set_json<T: Serialize>(
    cache: &dyn LocalCache,
    key: &str,
    value: &T,
) -> anyhow::Result<()> {
    let raw = serde_json::to_string(value)
        .with_context(|| format!("failed to serialize record {key}"))?;
    cache.set(key, &raw).await?;
    tracing::debug!(key, bytes = raw.len(), "cache record written");
    Ok(())
}

pub async fn contains(cache: &dyn LocalCache, key: &str) -> anyhow::Result<bool> {
    Ok(cache.get(key).await?.is_some())
}
