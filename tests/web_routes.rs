//! ルーター全体を通したHTTPレベルのテスト

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use image::{DynamicImage, Rgb, RgbImage};
use qr_webapp::AppConfig;
use qr_webapp::application::use_cases::DecodeImageUseCase;
use qr_webapp::domain::camera::CameraProvider;
use qr_webapp::domain::qr::{EncodeParameters, QrEncoder};
use qr_webapp::domain::session::CameraSessionStore;
use qr_webapp::infrastructure::camera::{ScriptedCameraProvider, UnavailableCameraProvider};
use qr_webapp::infrastructure::imaging::encode_png;
use qr_webapp::infrastructure::qr::{QrcodeEncoder, RqrrDecoder};
use qr_webapp::interfaces::web::server::create_router;
use qr_webapp::interfaces::web::state::AppState;
use qr_webapp::interfaces::web::{NO_WEBCAM_OUTPUT, SESSION_COOKIE};
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "X-QR-TEST-BOUNDARY";

struct TestApp {
    state: Arc<AppState>,
    router: Router,
}

impl TestApp {
    fn new(cameras: impl CameraProvider + 'static) -> Self {
        let config = AppConfig::default();
        let state = Arc::new(AppState::new(&config, Arc::new(cameras)));
        let router = create_router(Arc::clone(&state), config.max_upload_bytes);
        Self { state, router }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, header::HeaderMap, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, body.to_vec())
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> (StatusCode, header::HeaderMap, Vec<u8>) {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post_form(
        &self,
        uri: &str,
        form: &str,
        cookie: Option<&str>,
    ) -> (StatusCode, header::HeaderMap, Vec<u8>) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap())
            .await
    }

    async fn upload(&self, bytes: &[u8]) -> (StatusCode, header::HeaderMap, Vec<u8>) {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"qrImage\"; filename=\"upload.png\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri("/image")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }
}

/// `Set-Cookie` から `qr_session=<id>` を取り出す
fn session_cookie(headers: &header::HeaderMap) -> String {
    let value = headers
        .get(header::SET_COOKIE)
        .expect("response should set the session cookie")
        .to_str()
        .unwrap();
    let pair = value.split(';').next().unwrap().to_string();
    assert!(pair.starts_with(&format!("{SESSION_COOKIE}=")));
    pair
}

fn text(body: &[u8]) -> String {
    String::from_utf8_lossy(body).into_owned()
}

fn assert_redirects_home(status: StatusCode, headers: &header::HeaderMap) {
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers.get(header::LOCATION).unwrap(), "/");
}

fn qr_frame(payload: &str) -> RgbImage {
    let qr = QrcodeEncoder::default()
        .encode(payload, EncodeParameters::new(6, 4).unwrap())
        .unwrap();
    let qr = DynamicImage::ImageLuma8(qr).to_rgb8();

    let mut frame = blank_frame();
    let x = (frame.width() - qr.width()) as i64 / 2;
    let y = (frame.height() - qr.height()) as i64 / 2;
    image::imageops::overlay(&mut frame, &qr, x, y);
    frame
}

fn blank_frame() -> RgbImage {
    RgbImage::from_pixel(320, 240, Rgb([255, 255, 255]))
}

fn scripted(frames: Vec<RgbImage>) -> ScriptedCameraProvider {
    ScriptedCameraProvider::new().with_device(0, frames)
}

#[tokio::test]
async fn test_health_and_static_assets() {
    let app = TestApp::new(UnavailableCameraProvider::new());

    let (status, _, body) = app.get("/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text(&body), "OK");

    let (status, headers, _) = app.get("/static/style.css", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "text/css");

    let (status, _, _) = app.get("/static/missing.js", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_home_renders_form_and_sets_cookie() {
    let app = TestApp::new(UnavailableCameraProvider::new());

    for path in ["/", "/home"] {
        let (status, headers, body) = app.get(path, None).await;
        assert_eq!(status, StatusCode::OK);
        session_cookie(&headers);
        let page = text(&body);
        assert!(page.contains("name=\"QrData\""));
        assert!(!page.contains("data:image/png"));
    }
}

#[tokio::test]
async fn test_generate_then_download() {
    let app = TestApp::new(UnavailableCameraProvider::new());

    let (status, headers, body) = app
        .post_form("/", "BoxSize=5&BorderSize=2&QrData=hello+world", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let page = text(&body);
    assert!(page.contains("data:image/png;base64,"));
    assert!(page.contains("hello world"));
    let cookie = session_cookie(&headers);

    let (status, headers, png) = app.get("/download", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "image/png");
    let disposition = headers
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(disposition.starts_with("attachment; filename=\"qr_image_"));
    assert!(disposition.ends_with(".png\""));

    let decoded = DecodeImageUseCase::new(Arc::new(RqrrDecoder::new()))
        .execute(&png)
        .unwrap();
    assert_eq!(decoded.text, "hello world");
}

#[tokio::test]
async fn test_download_without_generated_image_redirects() {
    let app = TestApp::new(UnavailableCameraProvider::new());

    let (status, headers, _) = app.get("/download", None).await;
    assert_redirects_home(status, &headers);
}

#[tokio::test]
async fn test_visiting_home_discards_generated_image() {
    let app = TestApp::new(UnavailableCameraProvider::new());

    let (_, headers, _) = app
        .post_form("/home", "BoxSize=10&BorderSize=4&QrData=abc", None)
        .await;
    let cookie = session_cookie(&headers);

    app.get("/", Some(&cookie)).await;

    let (status, headers, _) = app.get("/download", Some(&cookie)).await;
    assert_redirects_home(status, &headers);
}

#[tokio::test]
async fn test_invalid_parameters_rerender_with_422() {
    let app = TestApp::new(UnavailableCameraProvider::new());

    let (status, _, body) = app
        .post_form("/", "BoxSize=0&BorderSize=4&QrData=abc", None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let page = text(&body);
    assert!(page.contains("Box size must be between 1 and 50"));
    assert!(page.contains(">abc</textarea>"));

    let (status, _, body) = app
        .post_form("/", "BoxSize=10&BorderSize=11&QrData=abc", None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(text(&body).contains("Border size must be between 1 and 10"));

    let (status, _, body) = app
        .post_form("/", "BoxSize=ten&BorderSize=4&QrData=abc", None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(text(&body).contains("whole numbers"));

    let long = "a".repeat(100);
    let (status, headers, body) = app
        .post_form("/", &format!("BoxSize=10&BorderSize=4&QrData={long}"), None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(text(&body).contains("too long"));

    // 失敗した生成はダウンロードできない
    let cookie = session_cookie(&headers);
    let (status, headers, _) = app.get("/download", Some(&cookie)).await;
    assert_redirects_home(status, &headers);
}

#[tokio::test]
async fn test_upload_decodes_qr_image() {
    let app = TestApp::new(UnavailableCameraProvider::new());

    let qr = QrcodeEncoder::default()
        .encode("from upload", EncodeParameters::new(8, 4).unwrap())
        .unwrap();
    let png = encode_png(qr).unwrap();

    let (status, _, body) = app.upload(&png).await;
    assert_eq!(status, StatusCode::OK);
    let page = text(&body);
    assert!(page.contains("Decoded: <code>from upload</code>"));
    assert!(page.contains("data:image/png;base64,"));
}

#[tokio::test]
async fn test_upload_edge_cases() {
    let app = TestApp::new(UnavailableCameraProvider::new());

    let (status, _, body) = app.upload(b"").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!text(&body).contains("Decoded:"));

    let (status, _, body) = app.upload(b"definitely not an image").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(text(&body).contains("class=\"error\""));

    let blank = encode_png(blank_frame()).unwrap();
    let (status, _, body) = app.upload(&blank).await;
    assert_eq!(status, StatusCode::OK);
    assert!(text(&body).contains("No QR code found."));
}

#[tokio::test]
async fn test_results_without_stream_redirects() {
    let app = TestApp::new(UnavailableCameraProvider::new());

    let (status, headers, _) = app.get("/webcam/results", None).await;
    assert_redirects_home(status, &headers);
}

#[tokio::test]
async fn test_stream_without_device_reports_no_output() {
    let app = TestApp::new(UnavailableCameraProvider::new());

    let (status, headers, body) = app.get("/webcam/stream/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text(&body), NO_WEBCAM_OUTPUT);

    // セッションは作成済みなので結果ページは空の一覧を表示する
    let cookie = session_cookie(&headers);
    let (status, _, body) = app.get("/webcam/results", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(text(&body).contains("No QR codes were read."));
}

#[tokio::test]
async fn test_stream_accumulates_codes_for_results() {
    let app = TestApp::new(scripted(vec![
        qr_frame("A"),
        blank_frame(),
        qr_frame("A"),
    ]));

    let (status, _, body) = app.get("/webcam", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(text(&body).contains("/webcam/stream/"));

    let (status, headers, body) = app.get("/webcam/stream/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get(header::CONTENT_TYPE).unwrap(),
        "multipart/x-mixed-replace; boundary=frame"
    );
    let marker = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";
    let parts = body.windows(marker.len()).filter(|w| *w == marker).count();
    assert_eq!(parts, 3);

    let cookie = session_cookie(&headers);
    let (status, _, body) = app.get("/webcam/results", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    let page = text(&body);
    assert!(page.contains("<li><code>A</code></li>"));
    assert_eq!(page.matches("<li>").count(), 1);
    assert!(!page.contains("<code></code>"));
}

#[tokio::test]
async fn test_new_stream_replaces_previous_camera_session() {
    let app = TestApp::new(scripted(vec![qr_frame("first")]));

    let (_, headers, _) = app.get("/webcam/stream/", None).await;
    let cookie = session_cookie(&headers);
    assert_eq!(app.state.camera_sessions.len().unwrap(), 1);

    app.get("/webcam/stream/", Some(&cookie)).await;
    assert_eq!(app.state.camera_sessions.len().unwrap(), 1);

    // 別のブラウザは独立したセッションを持つ
    app.get("/webcam/stream/", None).await;
    assert_eq!(app.state.camera_sessions.len().unwrap(), 2);

    // ホームに戻るとカメラセッションも破棄される
    app.get("/", Some(&cookie)).await;
    assert_eq!(app.state.camera_sessions.len().unwrap(), 1);
    let (status, headers, _) = app.get("/webcam/results", Some(&cookie)).await;
    assert_redirects_home(status, &headers);
}

#[tokio::test]
async fn test_concurrent_streams_keep_one_camera_session() {
    let app = TestApp::new(UnavailableCameraProvider::new());
    let (_, headers, _) = app.get("/webcam", None).await;
    let cookie = session_cookie(&headers);

    let opens: Vec<_> = (0..8)
        .map(|_| {
            let router = app.router.clone();
            let cookie = cookie.clone();
            tokio::spawn(async move {
                let request = Request::builder()
                    .uri("/webcam/stream/")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap();
                router.oneshot(request).await.unwrap().status()
            })
        })
        .collect();
    for open in opens {
        assert_eq!(open.await.unwrap(), StatusCode::OK);
    }

    // 最後に保存されたセッション以外はすべて破棄されている
    assert_eq!(app.state.camera_sessions.len().unwrap(), 1);
    let (status, _, body) = app.get("/webcam/results", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(text(&body).contains("No QR codes were read."));
}
