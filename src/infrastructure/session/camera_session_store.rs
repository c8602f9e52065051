use crate::domain::session::{CameraSession, CameraSessionId, CameraSessionStore, SessionError};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, info};

/// プロセス内メモリに保持するカメラセッションストア
#[derive(Debug, Default)]
pub struct InMemoryCameraSessionStore {
    sessions: RwLock<HashMap<CameraSessionId, CameraSession>>,
    next_id: AtomicU64,
}

impl InMemoryCameraSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<CameraSessionId, CameraSession>>, SessionError> {
        self.sessions.read().map_err(|_| SessionError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<CameraSessionId, CameraSession>>, SessionError> {
        self.sessions.write().map_err(|_| SessionError::LockPoisoned)
    }
}

impl CameraSessionStore for InMemoryCameraSessionStore {
    fn create(&self) -> Result<CameraSessionId, SessionError> {
        let id = CameraSessionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.write()?.insert(id, CameraSession::new(id));
        debug!("Camera session {} created", id);
        Ok(id)
    }

    fn remove(&self, id: CameraSessionId) -> Result<bool, SessionError> {
        let removed = self.write()?.remove(&id);
        if let Some(session) = &removed {
            debug!(
                "Camera session {} removed after {}s with {} codes",
                id,
                session.age(Utc::now()).num_seconds(),
                session.visible_codes().len()
            );
        }
        Ok(removed.is_some())
    }

    fn contains(&self, id: CameraSessionId) -> Result<bool, SessionError> {
        Ok(self.read()?.contains_key(&id))
    }

    fn record(&self, id: CameraSessionId, code: Option<&str>) -> Result<(), SessionError> {
        let mut sessions = self.write()?;
        let session = sessions
            .get_mut(&id)
            .ok_or(SessionError::CameraSessionNotFound(id))?;

        match code {
            Some(code) => {
                if session.record(code) {
                    info!("Camera session {}: new code {:?}", id, code);
                }
            }
            None => session.touch(),
        }
        Ok(())
    }

    fn codes(&self, id: CameraSessionId) -> Result<Vec<String>, SessionError> {
        self.read()?
            .get(&id)
            .map(CameraSession::visible_codes)
            .ok_or(SessionError::CameraSessionNotFound(id))
    }

    fn evict_idle(&self, now: DateTime<Utc>, ttl: Duration) -> Result<usize, SessionError> {
        let mut sessions = self.write()?;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_idle(now, ttl));
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("Evicted {} idle camera sessions", evicted);
        }
        Ok(evicted)
    }

    fn len(&self) -> Result<usize, SessionError> {
        Ok(self.read()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_not_reused_after_removal() {
        let store = InMemoryCameraSessionStore::new();
        let first = store.create().unwrap();
        let second = store.create().unwrap();
        assert!(store.remove(first).unwrap());

        let third = store.create().unwrap();
        assert_ne!(third, first);
        assert_ne!(third, second);
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_record_filters_empty_on_read() {
        let store = InMemoryCameraSessionStore::new();
        let id = store.create().unwrap();

        store.record(id, Some("A")).unwrap();
        store.record(id, Some("")).unwrap();
        store.record(id, None).unwrap();
        store.record(id, Some("A")).unwrap();

        assert_eq!(store.codes(id).unwrap(), vec!["A".to_string()]);
    }

    #[test]
    fn test_unknown_session() {
        let store = InMemoryCameraSessionStore::new();
        let missing = CameraSessionId::new(42);
        assert!(!store.contains(missing).unwrap());
        assert!(!store.remove(missing).unwrap());
        assert!(matches!(
            store.record(missing, Some("A")),
            Err(SessionError::CameraSessionNotFound(_))
        ));
        assert!(store.codes(missing).is_err());
    }

    #[test]
    fn test_evict_idle_keeps_recent_sessions() {
        let store = InMemoryCameraSessionStore::new();
        let id = store.create().unwrap();
        let ttl = Duration::from_secs(30);

        assert_eq!(store.evict_idle(Utc::now(), ttl).unwrap(), 0);
        assert!(store.contains(id).unwrap());

        let later = Utc::now() + chrono::Duration::seconds(31);
        assert_eq!(store.evict_idle(later, ttl).unwrap(), 1);
        assert!(!store.contains(id).unwrap());
    }
}
