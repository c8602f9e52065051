//! 画像の入出力
//!
//! アップロード画像の読み込みとPNG/JPEGへのエンコードを提供

pub mod overlay;

use crate::domain::camera::CameraError;
use crate::domain::qr::QrError;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;

/// アップロードされたバイト列をRGB画像として読み込む
pub fn load_rgb(bytes: &[u8]) -> Result<RgbImage, QrError> {
    image::load_from_memory(bytes)
        .map(|image| image.to_rgb8())
        .map_err(|e| QrError::InvalidImage(e.to_string()))
}

/// PNGにエンコード
pub fn encode_png(image: impl Into<DynamicImage>) -> Result<Vec<u8>, QrError> {
    let image: DynamicImage = image.into();
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| QrError::ImageEncodingFailed(e.to_string()))?;
    Ok(buffer.into_inner())
}

/// ストリーム用にJPEGへエンコード
pub fn encode_jpeg(frame: &RgbImage, quality: u8) -> Result<Vec<u8>, CameraError> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode_image(frame)
        .map_err(|e| CameraError::FrameEncodingFailed(e.to_string()))?;
    Ok(buffer)
}
