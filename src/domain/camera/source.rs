use super::CameraError;
use image::RgbImage;

/// 開かれたキャプチャデバイス
pub trait FrameSource: Send {
    /// 次のフレームを読み込む
    ///
    /// `Ok(None)` はソースの終端を表す。
    fn read_frame(&mut self) -> Result<Option<RgbImage>, CameraError>;

    /// ログ用のデバイス名
    fn describe(&self) -> String;
}

/// デバイス番号からキャプチャデバイスを開くトレイト
pub trait CameraProvider: Send + Sync {
    fn open(&self, index: u32) -> Result<Box<dyn FrameSource>, CameraError>;

    /// プロバイダ名
    fn name(&self) -> &'static str;
}
