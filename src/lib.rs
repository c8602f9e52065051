//! # QR Web App
//!
//! テキストからQRコードを生成し、アップロード画像やウェブカメラの映像から
//! QRコードを読み取る小さなWebアプリケーション
//!
//! 以下の層に分かれています：
//!
//! - **Domain Layer**: QRコード、キャプチャデバイス、セッションのモデル
//! - **Application Layer**: ユースケース
//! - **Infrastructure Layer**: `qrcode` / `rqrr` / `image` / V4L2 との統合
//! - **Interface Layer**: axum による Web インターフェース

pub mod application;
pub mod debug;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

// 公開API
pub use domain::*;

use application::use_cases::StreamSettings;
use infrastructure::qr::EncoderSettings;
use std::path::PathBuf;
use std::time::Duration;

/// アプリケーション全体の設定
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// 順に試すキャプチャデバイス番号
    pub camera_indices: Vec<u32>,
    /// 指定されている場合はこのディレクトリの画像をカメラとして再生する
    pub frames_dir: Option<PathBuf>,
    /// 再生時のフレーム間隔
    pub frame_interval: Duration,
    pub camera_session_ttl: Duration,
    pub browser_session_ttl: Duration,
    /// 期限切れセッションを掃除する間隔
    pub sweep_interval: Duration,
    pub encoder: EncoderSettings,
    pub stream: StreamSettings,
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            camera_indices: vec![0, 1, 2],
            frames_dir: None,
            frame_interval: Duration::from_millis(100),
            camera_session_ttl: Duration::from_secs(30 * 60),
            browser_session_ttl: Duration::from_secs(30 * 60),
            sweep_interval: Duration::from_secs(60),
            encoder: EncoderSettings::default(),
            stream: StreamSettings::default(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}
