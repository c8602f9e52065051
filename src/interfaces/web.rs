//! Web インターフェース
//!
//! QRコードの生成フォーム、画像アップロードによる読み取り、
//! ウェブカメラのMJPEGストリームと読み取り結果のページを提供します。
//! 各ブラウザは `qr_session` Cookie で識別されます。

mod browser_session;
mod embedded_assets;
mod error_response;
mod handlers;
mod models;
mod pages;
mod webcam_handlers;

pub mod server;
pub mod state;

pub use browser_session::{BrowserSession, SESSION_COOKIE};
pub use error_response::ErrorResponse;
pub use models::{NO_WEBCAM_OUTPUT, UPLOAD_FIELD};

// 内部使用のため、必要な型のみを再エクスポート
pub(crate) use handlers::{decode_upload, download, generate_qr, home_form, image_form};
pub(crate) use webcam_handlers::{webcam_page, webcam_results, webcam_stream};
