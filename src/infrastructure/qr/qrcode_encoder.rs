use crate::domain::qr::{EncodeParameters, QrEncoder, QrError};
use image::{GrayImage, Luma};
use qrcode::types::QrError as LibQrError;
use qrcode::{Color, EcLevel, QrCode, Version};
use tracing::debug;

/// エンコーダーの設定
#[derive(Debug, Clone, Copy, Default)]
pub struct EncoderSettings {
    /// バージョン1に収まらない場合に自動でバージョンを上げる
    pub auto_fit: bool,
}

/// `qrcode` クレートによるエンコーダー（誤り訂正レベルL）
pub struct QrcodeEncoder {
    settings: EncoderSettings,
}

impl Default for QrcodeEncoder {
    fn default() -> Self {
        Self::new(EncoderSettings::default())
    }
}

impl QrcodeEncoder {
    pub fn new(settings: EncoderSettings) -> Self {
        Self { settings }
    }

    fn build_code(&self, payload: &str) -> Result<QrCode, QrError> {
        let result = if self.settings.auto_fit {
            QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::L)
        } else {
            QrCode::with_version(payload.as_bytes(), Version::Normal(1), EcLevel::L)
        };

        result.map_err(|e| match e {
            LibQrError::DataTooLong => QrError::DataTooLong,
            other => QrError::EncodingFailed(other.to_string()),
        })
    }
}

impl QrEncoder for QrcodeEncoder {
    fn encode(&self, payload: &str, params: EncodeParameters) -> Result<GrayImage, QrError> {
        let code = self.build_code(payload)?;
        let modules = code.width() as u32;
        let colors = code.to_colors();
        let side = params.image_side(modules);

        debug!(
            modules,
            side,
            box_size = params.box_size,
            border = params.border,
            "Rendering QR code"
        );

        let border = params.border as i64;
        let image = GrayImage::from_fn(side, side, |x, y| {
            let mx = (x / params.box_size) as i64 - border;
            let my = (y / params.box_size) as i64 - border;
            let inside = (0..modules as i64).contains(&mx) && (0..modules as i64).contains(&my);
            let dark = inside && colors[(my * modules as i64 + mx) as usize] == Color::Dark;
            if dark { Luma([0]) } else { Luma([255]) }
        });

        Ok(image)
    }
}
