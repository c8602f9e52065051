use serde::Deserialize;

/// QRコード生成フォーム
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateForm {
    #[serde(rename = "BoxSize")]
    pub box_size: String,
    #[serde(rename = "BorderSize")]
    pub border_size: String,
    #[serde(rename = "QrData")]
    pub qr_data: String,
}

/// 画像アップロードフォームのファイルフィールド名
pub const UPLOAD_FIELD: &str = "qrImage";

/// カメラが見つからない場合にストリームの代わりに返す文字列
pub const NO_WEBCAM_OUTPUT: &str = "NoWebcamOutput";
