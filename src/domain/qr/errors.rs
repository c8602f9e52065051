use thiserror::Error;

#[derive(Error, Debug)]
pub enum QrError {
    #[error("Box size must be between 1 and 50, got {0}")]
    InvalidBoxSize(u32),

    #[error("Border size must be between 1 and 10, got {0}")]
    InvalidBorderSize(u32),

    #[error("Box size and border size must be whole numbers, got '{0}'")]
    InvalidNumber(String),

    #[error("Data is too long for the selected QR version")]
    DataTooLong,

    #[error("QR encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Unsupported or corrupt image: {0}")]
    InvalidImage(String),

    #[error("Image encoding failed: {0}")]
    ImageEncodingFailed(String),
}

impl QrError {
    /// ユーザー入力を直せば解決するエラーかチェック
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            QrError::InvalidBoxSize(_)
                | QrError::InvalidBorderSize(_)
                | QrError::InvalidNumber(_)
                | QrError::DataTooLong
                | QrError::InvalidImage(_)
        )
    }
}
