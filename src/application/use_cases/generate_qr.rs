use crate::domain::qr::{EncodeParameters, QrEncoder, QrError};
use crate::infrastructure::imaging::encode_png;
use crate::measure_time;
use base64::{Engine as _, engine::general_purpose};
use std::sync::Arc;
use tracing::info;

/// 生成されたQRコード画像
#[derive(Debug, Clone)]
pub struct GeneratedQr {
    pub png: Vec<u8>,
    pub side: u32,
}

impl GeneratedQr {
    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.png)
    }

    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", self.to_base64())
    }
}

pub struct GenerateQrUseCase {
    encoder: Arc<dyn QrEncoder>,
}

impl GenerateQrUseCase {
    pub fn new(encoder: Arc<dyn QrEncoder>) -> Self {
        Self { encoder }
    }

    pub fn execute(&self, payload: &str, params: EncodeParameters) -> Result<GeneratedQr, QrError> {
        measure_time!("generate_qr", {
            let image = self.encoder.encode(payload, params)?;
            let side = image.width();
            let png = encode_png(image)?;

            info!(
                "Generated QR code: {} chars, {}px, {} bytes",
                payload.chars().count(),
                side,
                png.len()
            );

            Ok(GeneratedQr { png, side })
        })
    }
}
