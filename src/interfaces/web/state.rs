use crate::AppConfig;
use crate::application::use_cases::{
    DecodeImageUseCase, GenerateQrUseCase, StreamWebcamUseCase, WebcamSessionUseCase,
};
use crate::domain::camera::CameraProvider;
use crate::domain::session::{BrowserSessionStore, CameraSessionStore, SessionError};
use crate::infrastructure::qr::{QrcodeEncoder, RqrrDecoder};
use crate::infrastructure::session::{InMemoryBrowserSessionStore, InMemoryCameraSessionStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

/// ハンドラ間で共有する状態
pub struct AppState {
    pub generate_qr: Arc<GenerateQrUseCase>,
    pub decode_image: Arc<DecodeImageUseCase>,
    pub stream_webcam: Arc<StreamWebcamUseCase>,
    pub webcam_sessions: WebcamSessionUseCase,
    pub browser_sessions: Arc<dyn BrowserSessionStore>,
    pub camera_sessions: Arc<dyn CameraSessionStore>,
    pub browser_session_ttl: Duration,
    pub camera_session_ttl: Duration,
    /// サーバー停止の通知。開いているストリームはこれを見て終了する
    shutdown: watch::Sender<bool>,
}

impl AppState {
    pub fn new(config: &AppConfig, cameras: Arc<dyn CameraProvider>) -> Self {
        let encoder = Arc::new(QrcodeEncoder::new(config.encoder));
        let decoder = Arc::new(RqrrDecoder::new());
        let camera_sessions: Arc<dyn CameraSessionStore> =
            Arc::new(InMemoryCameraSessionStore::new());
        let browser_sessions: Arc<dyn BrowserSessionStore> =
            Arc::new(InMemoryBrowserSessionStore::new());

        Self {
            generate_qr: Arc::new(GenerateQrUseCase::new(encoder)),
            decode_image: Arc::new(DecodeImageUseCase::new(decoder.clone())),
            stream_webcam: Arc::new(StreamWebcamUseCase::new(
                cameras,
                decoder,
                camera_sessions.clone(),
                config.camera_indices.clone(),
                config.stream,
            )),
            webcam_sessions: WebcamSessionUseCase::new(camera_sessions.clone()),
            browser_sessions,
            camera_sessions,
            browser_session_ttl: config.browser_session_ttl,
            camera_session_ttl: config.camera_session_ttl,
            shutdown: watch::channel(false).0,
        }
    }

    /// 開いているストリームに終了を通知する
    pub fn begin_shutdown(&self) {
        if !self.shutdown.send_replace(true) {
            info!("Closing open webcam streams");
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// 期限切れのブラウザセッションとアイドル状態のカメラセッションを削除
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<(usize, usize), SessionError> {
        let browser = self
            .browser_sessions
            .evict_expired(now, self.browser_session_ttl)
            .await?;
        let camera = self
            .camera_sessions
            .evict_idle(now, self.camera_session_ttl)?;
        debug!(browser, camera, "Session sweep finished");
        Ok((browser, camera))
    }
}
