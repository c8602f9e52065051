use crate::domain::session::{
    BrowserSessionData, BrowserSessionId, BrowserSessionStore, SessionError, SessionUpdate,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

/// プロセス内メモリに保持するブラウザセッションストア
#[derive(Debug, Default)]
pub struct InMemoryBrowserSessionStore {
    sessions: RwLock<HashMap<BrowserSessionId, BrowserSessionData>>,
}

impl InMemoryBrowserSessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BrowserSessionStore for InMemoryBrowserSessionStore {
    async fn load(&self, id: &BrowserSessionId) -> Result<BrowserSessionData, SessionError> {
        Ok(self.sessions.read().await.get(id).cloned().unwrap_or_default())
    }

    async fn save(&self, id: &BrowserSessionId, mut data: BrowserSessionData) -> Result<(), SessionError> {
        data.last_activity = Utc::now();
        self.sessions.write().await.insert(*id, data);
        Ok(())
    }

    async fn update(
        &self,
        id: &BrowserSessionId,
        apply: SessionUpdate<'_>,
    ) -> Result<BrowserSessionData, SessionError> {
        let mut sessions = self.sessions.write().await;
        let mut data = sessions.get(id).cloned().unwrap_or_default();
        apply(&mut data)?;
        data.last_activity = Utc::now();
        sessions.insert(*id, data.clone());
        Ok(data)
    }

    async fn clear(&self, id: &BrowserSessionId) -> Result<Option<BrowserSessionData>, SessionError> {
        Ok(self.sessions.write().await.remove(id))
    }

    async fn evict_expired(&self, now: DateTime<Utc>, ttl: Duration) -> Result<usize, SessionError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, data| !data.is_expired(now, ttl));
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("Evicted {} expired browser sessions", evicted);
        }
        Ok(evicted)
    }
}
