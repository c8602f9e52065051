use super::{
    decode_upload, download, embedded_assets::WebAssets, generate_qr, home_form, image_form,
    state::AppState, webcam_page, webcam_results, webcam_stream,
};
use crate::AppConfig;
use crate::domain::camera::CameraProvider;
use axum::{
    Router,
    extract::{DefaultBodyLimit, Path},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// ルーターを組み立てる
pub fn create_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(home_form).post(generate_qr))
        .route("/home", get(home_form).post(generate_qr))
        .route("/download", get(download))
        .route("/image", get(image_form).post(decode_upload))
        .route("/webcam", get(webcam_page))
        .route("/webcam/stream/", get(webcam_stream))
        .route("/webcam/results", get(webcam_results))
        .route("/api/health", get(|| async { "OK" }))
        .route("/static/{*path}", get(static_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}

pub async fn create_server(config: AppConfig, cameras: Arc<dyn CameraProvider>) -> anyhow::Result<()> {
    info!(
        "Starting QR web server (built {})...",
        env!("BUILD_TIMESTAMP")
    );

    // Parse socket address
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let state = Arc::new(AppState::new(&config, cameras));
    spawn_session_sweeper(Arc::clone(&state), config.sweep_interval);

    // Create TCP listener
    let listener = TcpListener::bind(&addr).await?;

    println!("🌐 Web server started successfully!");
    println!("   URL: http://{addr}");
    println!("   Press Ctrl+C to stop");

    serve(listener, state, config.max_upload_bytes, shutdown_signal()).await?;

    info!("Web server stopped");
    Ok(())
}

/// `signal` が完了するまでリクエストを処理する
///
/// 停止時は開いているウェブカメラストリームにも終了を通知し、
/// それらが閉じるのを待ってから戻る。
pub async fn serve<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    max_upload_bytes: usize,
    signal: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(Arc::clone(&state), max_upload_bytes);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            signal.await;
            state.begin_shutdown();
        })
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}

/// 期限切れのセッションを定期的に削除する
fn spawn_session_sweeper(state: Arc<AppState>, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // 最初のティックは即座に完了するので読み飛ばす
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match state.sweep_expired(chrono::Utc::now()).await {
                Ok((0, 0)) => {}
                Ok((browser, camera)) => {
                    info!("Evicted {} browser and {} camera sessions", browser, camera)
                }
                Err(e) => warn!("Session sweep failed: {}", e),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// 埋め込まれた静的ファイルを提供するハンドラ
async fn static_handler(Path(path): Path<String>) -> Response {
    let path = format!("static/{}", path.trim_start_matches('/'));

    match WebAssets::get(&path) {
        Some(content) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref().to_string())],
                content.data.into_owned(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}
