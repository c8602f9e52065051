//! セッションのエンティティ
//!
//! カメラセッション（ストリーム中に読み取ったQRコードの集合）と
//! ブラウザセッション（Cookieで識別されるサーバー側の状態）を定義

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// カメラセッションID
///
/// ストアが単調増加カウンタから発行するため、削除後も再利用されない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CameraSessionId(u64);

impl CameraSessionId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for CameraSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ウェブカメラストリーム1回分の読み取り結果
#[derive(Debug, Clone)]
pub struct CameraSession {
    pub id: CameraSessionId,
    codes: HashSet<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl CameraSession {
    pub fn new(id: CameraSessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            codes: HashSet::new(),
            created_at: now,
            last_activity: now,
        }
    }

    /// デコード結果を記録する。空文字列もそのまま保持する
    pub fn record(&mut self, code: &str) -> bool {
        self.touch();
        self.codes.insert(code.to_string())
    }

    /// 最終アクティビティを更新
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// 表示用のコード一覧（空文字列を除外してソート）
    pub fn visible_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self
            .codes
            .iter()
            .filter(|code| !code.is_empty())
            .cloned()
            .collect();
        codes.sort();
        codes
    }

    /// 作成からの経過時間
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }

    pub fn is_idle(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        is_older_than(self.last_activity, now, ttl)
    }
}

/// ブラウザセッションID（Cookieの値）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BrowserSessionId(Uuid);

impl BrowserSessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for BrowserSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BrowserSessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// ブラウザセッションに保持する状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserSessionData {
    /// 最後に生成したQRコード画像（PNGのBase64）
    pub image_base64: Option<String>,
    /// 現在のカメラセッション
    pub camera_session: Option<CameraSessionId>,
    pub last_activity: DateTime<Utc>,
}

impl Default for BrowserSessionData {
    fn default() -> Self {
        Self {
            image_base64: None,
            camera_session: None,
            last_activity: Utc::now(),
        }
    }
}

impl BrowserSessionData {
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        is_older_than(self.last_activity, now, ttl)
    }
}

fn is_older_than(since: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    // 時刻が逆行した場合は期限切れとみなさない
    (now - since).to_std().is_ok_and(|elapsed| elapsed > ttl)
}
