use super::CameraSessionId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Camera session not found: {0}")]
    CameraSessionNotFound(CameraSessionId),

    #[error("Session store lock poisoned")]
    LockPoisoned,
}

impl SessionError {
    /// 呼び出し側が「セッションなし」として扱えるエラーかチェック
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SessionError::CameraSessionNotFound(_))
    }
}
