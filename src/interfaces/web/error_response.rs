use crate::domain::qr::QrError;
use crate::domain::session::SessionError;
use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tokio::task::JoinError;
use tracing::error;

/// HTMLページで表現できないエラーのレスポンス
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl ErrorResponse {
    pub fn new(status_code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            error: status_code
                .canonical_reason()
                .unwrap_or("Unknown Error")
                .to_string(),
            message: message.into(),
            status_code: status_code.as_u16(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        error!("Internal error: {}", message);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status_code, Json(self)).into_response()
    }
}

impl From<MultipartError> for ErrorResponse {
    fn from(err: MultipartError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, format!("Malformed upload: {}", err.body_text()))
    }
}

impl From<SessionError> for ErrorResponse {
    fn from(err: SessionError) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<QrError> for ErrorResponse {
    fn from(err: QrError) -> Self {
        if err.is_validation_error() {
            Self::new(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
        } else {
            Self::internal(err.to_string())
        }
    }
}

impl From<JoinError> for ErrorResponse {
    fn from(err: JoinError) -> Self {
        Self::internal(format!("Background task failed: {err}"))
    }
}
