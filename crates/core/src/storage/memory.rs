use crate::storage::LocalCache;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

/// Process-local cache. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryCache {
    records: Mutex<BTreeMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.records.lock().await.keys().cloned().collect()
    }
}

#[async_trait::async_trait]
impl LocalCache for MemoryCache {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.records.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.records
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.records.lock().await.remove(key);
        Ok(())
    }
}
