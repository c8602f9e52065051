use crate::domain::qr::{BoundingQuad, DecodeOutcome, QrDecoder, QrError};
use crate::infrastructure::imaging::{encode_png, load_rgb};
use crate::measure_time;
use base64::{Engine as _, engine::general_purpose};
use std::sync::Arc;
use tracing::{info, warn};

/// アップロード画像の読み取り結果
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// デコードされた文字列。見つからなかった場合は空文字列
    pub text: String,
    pub bounds: Option<BoundingQuad>,
    /// プレビュー用に再エンコードしたPNG
    pub preview_png: Vec<u8>,
}

impl DecodedImage {
    pub fn preview_data_uri(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(&self.preview_png)
        )
    }
}

pub struct DecodeImageUseCase {
    decoder: Arc<dyn QrDecoder>,
}

impl DecodeImageUseCase {
    pub fn new(decoder: Arc<dyn QrDecoder>) -> Self {
        Self { decoder }
    }

    pub fn execute(&self, bytes: &[u8]) -> Result<DecodedImage, QrError> {
        measure_time!("decode_image", {
            let image = load_rgb(bytes)?;
            let outcome = self.decoder.decode(&image);

            if let DecodeOutcome::Fault(message) = &outcome {
                warn!("Decoder fault on uploaded image: {}", message);
            }
            info!(
                "Decoded uploaded image {}x{}: {}",
                image.width(),
                image.height(),
                if outcome.text().is_empty() { "no code" } else { "code found" }
            );

            Ok(DecodedImage {
                text: outcome.text().to_string(),
                bounds: outcome.bounds(),
                preview_png: encode_png(image)?,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::qr::{EncodeParameters, QrEncoder};
    use crate::infrastructure::qr::{QrcodeEncoder, RqrrDecoder};
    use image::{GrayImage, Luma};

    fn use_case() -> DecodeImageUseCase {
        DecodeImageUseCase::new(Arc::new(RqrrDecoder::new()))
    }

    #[test]
    fn test_decodes_uploaded_png() {
        let qr = QrcodeEncoder::default()
            .encode("upload me", EncodeParameters::new(6, 4).unwrap())
            .unwrap();
        let png = encode_png(qr).unwrap();

        let decoded = use_case().execute(&png).unwrap();
        assert_eq!(decoded.text, "upload me");
        assert!(decoded.bounds.is_some());
        assert!(decoded.preview_data_uri().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_image_without_code_returns_empty_text() {
        let png = encode_png(GrayImage::from_pixel(100, 80, Luma([255]))).unwrap();
        let decoded = use_case().execute(&png).unwrap();
        assert_eq!(decoded.text, "");
        assert!(decoded.bounds.is_none());
    }

    #[test]
    fn test_garbage_upload_is_rejected() {
        assert!(matches!(
            use_case().execute(b"GIF89a?"),
            Err(QrError::InvalidImage(_))
        ));
    }
}
