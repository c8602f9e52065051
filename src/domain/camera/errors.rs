use thiserror::Error;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("No capture device produced a frame (probed: {0:?})")]
    DeviceNotFound(Vec<u32>),

    #[error("Failed to open capture device {index}: {message}")]
    OpenFailed { index: u32, message: String },

    #[error("Unsupported pixel format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read frame: {0}")]
    ReadFailed(String),

    /// デバイスは動いているが、1フレーム分のデータが壊れていた
    #[error("Captured frame is corrupt: {0}")]
    CorruptFrame(String),

    #[error("Failed to encode frame: {0}")]
    FrameEncodingFailed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl CameraError {
    /// 次のフレームを読めば回復する可能性があるエラーかチェック
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CameraError::CorruptFrame(_))
    }
}

impl From<std::io::Error> for CameraError {
    fn from(error: std::io::Error) -> Self {
        CameraError::IoError(error.to_string())
    }
}
