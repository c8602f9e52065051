use crate::domain::session::{CameraSessionId, CameraSessionStore, SessionError};
use std::sync::Arc;
use tracing::{debug, info};

/// カメラセッションの開始・参照・破棄
pub struct WebcamSessionUseCase {
    sessions: Arc<dyn CameraSessionStore>,
}

impl WebcamSessionUseCase {
    pub fn new(sessions: Arc<dyn CameraSessionStore>) -> Self {
        Self { sessions }
    }

    /// 直前のカメラセッションを破棄してから新しいセッションを作成
    pub fn start(&self, previous: Option<CameraSessionId>) -> Result<CameraSessionId, SessionError> {
        if let Some(previous) = previous {
            self.release(previous)?;
        }
        let id = self.sessions.create()?;
        info!("Camera session {} started", id);
        Ok(id)
    }

    /// 読み取り結果（空文字列を除く）。セッションが存在しない場合は `None`
    pub fn results(&self, id: CameraSessionId) -> Result<Option<Vec<String>>, SessionError> {
        match self.sessions.codes(id) {
            Ok(codes) => Ok(Some(codes)),
            Err(e) if e.is_recoverable() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn release(&self, id: CameraSessionId) -> Result<bool, SessionError> {
        let removed = self.sessions.remove(id)?;
        if removed {
            debug!("Camera session {} released", id);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::session::InMemoryCameraSessionStore;

    #[test]
    fn test_start_replaces_previous_session() {
        let store = Arc::new(InMemoryCameraSessionStore::new());
        let use_case = WebcamSessionUseCase::new(store.clone());

        let first = use_case.start(None).unwrap();
        store.record(first, Some("old")).unwrap();

        let second = use_case.start(Some(first)).unwrap();
        assert_ne!(first, second);
        assert!(!store.contains(first).unwrap());
        assert!(store.contains(second).unwrap());
        assert_eq!(use_case.results(first).unwrap(), None);
        assert_eq!(use_case.results(second).unwrap(), Some(vec![]));
    }

    /// ロックが壊れたストア
    struct PoisonedStore;

    impl CameraSessionStore for PoisonedStore {
        fn create(&self) -> Result<CameraSessionId, SessionError> {
            Err(SessionError::LockPoisoned)
        }
        fn remove(&self, _id: CameraSessionId) -> Result<bool, SessionError> {
            Err(SessionError::LockPoisoned)
        }
        fn contains(&self, _id: CameraSessionId) -> Result<bool, SessionError> {
            Err(SessionError::LockPoisoned)
        }
        fn record(&self, _id: CameraSessionId, _code: Option<&str>) -> Result<(), SessionError> {
            Err(SessionError::LockPoisoned)
        }
        fn codes(&self, _id: CameraSessionId) -> Result<Vec<String>, SessionError> {
            Err(SessionError::LockPoisoned)
        }
        fn evict_idle(
            &self,
            _now: chrono::DateTime<chrono::Utc>,
            _ttl: std::time::Duration,
        ) -> Result<usize, SessionError> {
            Err(SessionError::LockPoisoned)
        }
        fn len(&self) -> Result<usize, SessionError> {
            Err(SessionError::LockPoisoned)
        }
    }

    #[test]
    fn test_missing_session_is_not_an_error_but_store_failure_is() {
        let missing = CameraSessionId::new(42);

        let use_case = WebcamSessionUseCase::new(Arc::new(InMemoryCameraSessionStore::new()));
        assert_eq!(use_case.results(missing).unwrap(), None);

        let use_case = WebcamSessionUseCase::new(Arc::new(PoisonedStore));
        assert!(matches!(
            use_case.results(missing),
            Err(SessionError::LockPoisoned)
        ));
        assert!(SessionError::CameraSessionNotFound(missing).is_recoverable());
        assert!(!SessionError::LockPoisoned.is_recoverable());
    }

    #[test]
    fn test_results_hide_empty_codes() {
        let store = Arc::new(InMemoryCameraSessionStore::new());
        let use_case = WebcamSessionUseCase::new(store.clone());

        let id = use_case.start(None).unwrap();
        store.record(id, Some("")).unwrap();
        store.record(id, Some("B")).unwrap();
        store.record(id, Some("A")).unwrap();

        assert_eq!(
            use_case.results(id).unwrap(),
            Some(vec!["A".to_string(), "B".to_string()])
        );
    }
}
