use super::browser_session::BrowserSession;
use super::error_response::ErrorResponse;
use super::models::{GenerateForm, UPLOAD_FIELD};
use super::pages::{self, HomeView, ReadImageView};
use super::state::AppState;
use crate::domain::qr::EncodeParameters;
use crate::domain::session::BrowserSessionData;
use axum::{
    Form,
    extract::{Multipart, State},
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use base64::{Engine as _, engine::general_purpose};
use std::sync::Arc;
use tracing::{info, warn};

/// Set-Cookie を付けてレスポンスを返す
pub(crate) fn with_cookie(
    state: &AppState,
    session: &BrowserSession,
    response: impl IntoResponse,
) -> Result<Response, ErrorResponse> {
    let cookie = session
        .cookie(state.browser_session_ttl)
        .map_err(|e| ErrorResponse::internal(format!("Invalid session cookie: {e}")))?;
    let mut response = response.into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

/// ブラウザセッションを初期化し、紐づくカメラセッションも破棄する
async fn reset_browser_session(
    state: &AppState,
    session: &BrowserSession,
) -> Result<(), ErrorResponse> {
    let previous = state.browser_sessions.clear(&session.id).await?;
    if let Some(camera) = previous.and_then(|data| data.camera_session) {
        state.webcam_sessions.release(camera)?;
    }
    Ok(())
}

/// Empty generator form
pub async fn home_form(
    State(state): State<Arc<AppState>>,
    session: BrowserSession,
) -> Result<Response, ErrorResponse> {
    reset_browser_session(&state, &session).await?;
    let page = pages::home(&HomeView::default());
    with_cookie(&state, &session, Html(page))
}

/// Generate a QR code from the submitted form
pub async fn generate_qr(
    State(state): State<Arc<AppState>>,
    session: BrowserSession,
    Form(form): Form<GenerateForm>,
) -> Result<Response, ErrorResponse> {
    reset_browser_session(&state, &session).await?;

    let generated = match EncodeParameters::parse(&form.box_size, &form.border_size) {
        Ok(params) => {
            let use_case = Arc::clone(&state.generate_qr);
            let payload = form.qr_data.clone();
            tokio::task::spawn_blocking(move || use_case.execute(&payload, params)).await?
        }
        Err(e) => Err(e),
    };

    match generated {
        Ok(generated) => {
            let image_uri = generated.data_uri();
            state
                .browser_sessions
                .save(
                    &session.id,
                    BrowserSessionData {
                        image_base64: Some(generated.to_base64()),
                        ..BrowserSessionData::default()
                    },
                )
                .await?;

            let page = pages::home(&HomeView {
                box_size: &form.box_size,
                border_size: &form.border_size,
                qr_data: &form.qr_data,
                image_uri: Some(&image_uri),
                error: None,
            });
            with_cookie(&state, &session, Html(page))
        }
        Err(e) if e.is_validation_error() => {
            info!("Rejected QR generation request: {}", e);
            let page = pages::home(&HomeView {
                box_size: &form.box_size,
                border_size: &form.border_size,
                qr_data: &form.qr_data,
                image_uri: None,
                error: Some(e.to_string()),
            });
            with_cookie(
                &state,
                &session,
                (StatusCode::UNPROCESSABLE_ENTITY, Html(page)),
            )
        }
        Err(e) => Err(e.into()),
    }
}

/// Download the most recently generated image
pub async fn download(
    State(state): State<Arc<AppState>>,
    session: BrowserSession,
) -> Result<Response, ErrorResponse> {
    let data = state.browser_sessions.load(&session.id).await?;

    let png = match data
        .image_base64
        .as_deref()
        .map(|encoded| general_purpose::STANDARD.decode(encoded))
    {
        Some(Ok(png)) => png,
        Some(Err(e)) => {
            warn!("Stored QR image for session {} is corrupt: {}", session.id, e);
            return with_cookie(&state, &session, Redirect::to("/"));
        }
        None => return with_cookie(&state, &session, Redirect::to("/")),
    };

    let filename = download_filename(chrono::Local::now());
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .map_err(|e| ErrorResponse::internal(e.to_string()))?;

    let response = (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/png")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        png,
    );
    with_cookie(&state, &session, response)
}

pub(crate) fn download_filename(now: chrono::DateTime<chrono::Local>) -> String {
    now.format("qr_image_%Y_%m_%d_%H_%M_%S.png").to_string()
}

/// Empty upload form
pub async fn image_form(
    State(state): State<Arc<AppState>>,
    session: BrowserSession,
) -> Result<Response, ErrorResponse> {
    let page = pages::read_image(&ReadImageView::default());
    with_cookie(&state, &session, Html(page))
}

/// Decode an uploaded image
pub async fn decode_upload(
    State(state): State<Arc<AppState>>,
    session: BrowserSession,
    mut multipart: Multipart,
) -> Result<Response, ErrorResponse> {
    let mut image_data = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            image_data = field.bytes().await?.to_vec();
        }
    }

    if image_data.is_empty() {
        let page = pages::read_image(&ReadImageView::default());
        return with_cookie(&state, &session, Html(page));
    }

    info!("Decoding uploaded image ({} bytes)", image_data.len());

    let use_case = Arc::clone(&state.decode_image);
    let decoded = tokio::task::spawn_blocking(move || use_case.execute(&image_data)).await?;

    match decoded {
        Ok(decoded) => {
            let preview_uri = decoded.preview_data_uri();
            let page = pages::read_image(&ReadImageView {
                decoded_text: Some(&decoded.text),
                preview_uri: Some(&preview_uri),
                error: None,
            });
            with_cookie(&state, &session, Html(page))
        }
        Err(e) if e.is_validation_error() => {
            info!("Rejected uploaded image: {}", e);
            let page = pages::read_image(&ReadImageView {
                error: Some(e.to_string()),
                ..ReadImageView::default()
            });
            with_cookie(&state, &session, (StatusCode::BAD_REQUEST, Html(page)))
        }
        Err(e) => Err(e.into()),
    }
}
