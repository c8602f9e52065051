use super::{BrowserSessionData, BrowserSessionId, CameraSessionId, SessionError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// カメラセッションのストア
///
/// キャプチャループはブロッキングスレッドで動くため同期APIとしている。
pub trait CameraSessionStore: Send + Sync {
    /// 空のセッションを作成して新しいIDを発行
    fn create(&self) -> Result<CameraSessionId, SessionError>;

    /// セッションを削除。存在していた場合は `true`
    fn remove(&self, id: CameraSessionId) -> Result<bool, SessionError>;

    fn contains(&self, id: CameraSessionId) -> Result<bool, SessionError>;

    /// フレーム処理の結果を記録
    ///
    /// `code` が `Some` の場合は集合に追加し、いずれの場合も最終アクティビティを更新する。
    fn record(&self, id: CameraSessionId, code: Option<&str>) -> Result<(), SessionError>;

    /// 表示用のコード一覧（空文字列を除く）
    fn codes(&self, id: CameraSessionId) -> Result<Vec<String>, SessionError>;

    /// 一定時間アクティビティのないセッションを削除し、削除件数を返す
    fn evict_idle(&self, now: DateTime<Utc>, ttl: Duration) -> Result<usize, SessionError>;

    fn len(&self) -> Result<usize, SessionError>;

    fn is_empty(&self) -> Result<bool, SessionError> {
        Ok(self.len()? == 0)
    }
}

/// `BrowserSessionStore::update` に渡す変更処理
pub type SessionUpdate<'a> =
    Box<dyn FnOnce(&mut BrowserSessionData) -> Result<(), SessionError> + Send + 'a>;

/// ブラウザセッションのストア
#[async_trait]
pub trait BrowserSessionStore: Send + Sync {
    /// セッションを読み込む。存在しない場合は初期状態を返す
    async fn load(&self, id: &BrowserSessionId) -> Result<BrowserSessionData, SessionError>;

    /// セッションを保存し、最終アクティビティを更新
    async fn save(&self, id: &BrowserSessionId, data: BrowserSessionData) -> Result<(), SessionError>;

    /// 読み込み・変更・保存を他の書き込みと競合しないよう一度に行い、保存後の状態を返す
    ///
    /// `apply` がエラーを返した場合は何も保存しない。
    async fn update(
        &self,
        id: &BrowserSessionId,
        apply: SessionUpdate<'_>,
    ) -> Result<BrowserSessionData, SessionError>;

    /// セッションを削除し、直前の状態を返す
    async fn clear(&self, id: &BrowserSessionId) -> Result<Option<BrowserSessionData>, SessionError>;

    async fn evict_expired(&self, now: DateTime<Utc>, ttl: Duration) -> Result<usize, SessionError>;
}
