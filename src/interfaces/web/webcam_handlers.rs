//! ウェブカメラのページ、MJPEGストリーム、読み取り結果

use super::browser_session::BrowserSession;
use super::error_response::ErrorResponse;
use super::handlers::with_cookie;
use super::models::NO_WEBCAM_OUTPUT;
use super::pages;
use super::state::AppState;
use crate::application::use_cases::stream_webcam::STREAM_CONTENT_TYPE;
use crate::domain::session::{BrowserSessionData, SessionError};
use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{Html, Redirect, Response},
};
use futures::StreamExt;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

/// 送信待ちにできるチャンク数。受信側が遅い場合はキャプチャループが待つ
const CHUNK_BUFFER: usize = 2;

pub async fn webcam_page(
    State(state): State<Arc<AppState>>,
    session: BrowserSession,
) -> Result<Response, ErrorResponse> {
    with_cookie(&state, &session, Html(pages::read_webcam()))
}

/// Open a new camera session and stream annotated frames
pub async fn webcam_stream(
    State(state): State<Arc<AppState>>,
    session: BrowserSession,
) -> Result<Response, ErrorResponse> {
    // 同じブラウザから同時に開かれても、カメラセッションは1つだけ残る
    let data = state
        .browser_sessions
        .update(
            &session.id,
            Box::new(|data: &mut BrowserSessionData| -> Result<(), SessionError> {
                data.camera_session = Some(state.webcam_sessions.start(data.camera_session)?);
                Ok(())
            }),
        )
        .await?;
    let Some(camera_session) = data.camera_session else {
        return Err(ErrorResponse::internal("Camera session was not stored"));
    };

    let use_case = Arc::clone(&state.stream_webcam);
    let opened = tokio::task::spawn_blocking(move || use_case.open(camera_session)).await?;

    let stream = match opened {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Webcam stream unavailable for camera session {}: {}", camera_session, e);
            return with_cookie(&state, &session, NO_WEBCAM_OUTPUT);
        }
    };

    info!(
        "Streaming camera session {} from {}",
        stream.session(),
        stream.device()
    );

    let (tx, rx) = mpsc::channel::<Vec<u8>>(CHUNK_BUFFER);
    let mut shutdown = state.subscribe_shutdown();
    let runtime = tokio::runtime::Handle::current();
    tokio::task::spawn_blocking(move || {
        // 受信側の切断かサーバー停止でループが終わり、デバイスが解放される
        let summary =
            stream.run(|chunk| runtime.block_on(forward_chunk(&tx, &mut shutdown, chunk)));
        debug!("Capture loop finished: {:?}", summary);
    });

    let body = Body::from_stream(ReceiverStream::new(rx).map(Ok::<_, Infallible>));
    let response = ([(header::CONTENT_TYPE, STREAM_CONTENT_TYPE)], body);
    with_cookie(&state, &session, response)
}

/// チャンクを受信側へ渡す。送れなかった場合は `false`
///
/// 受信側が読まなくなっても、サーバー停止の通知があれば待ちを抜ける。
async fn forward_chunk(
    tx: &mpsc::Sender<Vec<u8>>,
    shutdown: &mut watch::Receiver<bool>,
    chunk: Vec<u8>,
) -> bool {
    if *shutdown.borrow() {
        return false;
    }
    tokio::select! {
        sent = tx.send(chunk) => sent.is_ok(),
        _ = shutdown.wait_for(|stopping| *stopping) => false,
    }
}

/// Codes read during the current camera session
pub async fn webcam_results(
    State(state): State<Arc<AppState>>,
    session: BrowserSession,
) -> Result<Response, ErrorResponse> {
    let data = state.browser_sessions.load(&session.id).await?;

    let codes = match data.camera_session {
        Some(camera_session) => state.webcam_sessions.results(camera_session)?,
        None => None,
    };

    match codes {
        Some(codes) => with_cookie(
            &state,
            &session,
            Html(pages::webcam_results(&codes)),
        ),
        None => with_cookie(&state, &session, Redirect::to("/")),
    }
}
