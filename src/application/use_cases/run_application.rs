use crate::AppConfig;
use crate::domain::camera::CameraProvider;
use crate::infrastructure::camera::{ReplayCameraProvider, UnavailableCameraProvider};
use crate::interfaces::web::server::create_server;
use std::sync::Arc;
use tracing::info;

pub struct RunApplicationUseCase {
    config: AppConfig,
}

impl RunApplicationUseCase {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub async fn execute(&self) -> anyhow::Result<()> {
        let cameras = select_camera_provider(&self.config);
        info!("Capture backend: {}", cameras.name());

        // Delegate to the web server module
        create_server(self.config.clone(), cameras).await
    }
}

/// 設定に応じてキャプチャバックエンドを選択
///
/// 画像ディレクトリが指定されていればそれを再生し、なければ V4L2 を使う。
pub fn select_camera_provider(config: &AppConfig) -> Arc<dyn CameraProvider> {
    if let Some(dir) = &config.frames_dir {
        return Arc::new(ReplayCameraProvider::new(dir.clone(), config.frame_interval));
    }

    #[cfg(feature = "v4l2")]
    {
        Arc::new(crate::infrastructure::camera::V4l2CameraProvider::new())
    }

    #[cfg(not(feature = "v4l2"))]
    {
        Arc::new(UnavailableCameraProvider::new())
    }
}
