use super::{DecodeOutcome, EncodeParameters, QrError};
use image::{GrayImage, RgbImage};

/// QRコードエンコーダーのトレイト
pub trait QrEncoder: Send + Sync {
    /// ペイロードをQRコード画像にエンコード
    fn encode(&self, payload: &str, params: EncodeParameters) -> Result<GrayImage, QrError>;
}

/// QRコードデコーダーのトレイト
///
/// QRコードが含まれない画像や壊れた画像でもエラーにはならず、
/// `DecodeOutcome::NotFound` または `DecodeOutcome::Fault` を返す。
pub trait QrDecoder: Send + Sync {
    /// 画像からQRシンボルを1つ探してデコード
    fn decode(&self, frame: &RgbImage) -> DecodeOutcome;
}
