//! ウェブカメラのストリーミングと読み取り結果の蓄積
//!
//! キャプチャデバイスを探してフレームを読み込み続け、各フレームをデコードして
//! カメラセッションにコードを記録しながら、注釈付きのJPEGを
//! `multipart/x-mixed-replace` のチャンクとして送り出す。

use crate::domain::camera::{CameraError, CameraProvider, FrameSource};
use crate::domain::qr::{DecodeOutcome, QrDecoder};
use crate::domain::session::{CameraSessionId, CameraSessionStore, SessionError};
use crate::infrastructure::imaging::{encode_jpeg, overlay};
use image::RgbImage;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const FRAME_BOUNDARY: &str = "frame";
pub const STREAM_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";
/// 連続して壊れたフレームがこの数を超えたらデバイスを諦める
pub const MAX_CONSECUTIVE_CORRUPT_FRAMES: u32 = 30;

/// ストリームの設定
#[derive(Debug, Clone, Copy)]
pub struct StreamSettings {
    /// この面積（ピクセル²）未満の検出結果だけを描画する
    pub annotation_area_threshold: f64,
    pub jpeg_quality: u8,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            annotation_area_threshold: 50_000.0,
            jpeg_quality: 80,
        }
    }
}

/// ストリームの終了理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// ソースがフレームを返さなくなった
    SourceExhausted,
    /// フレームの読み込みに失敗した
    ReadFailed,
    /// 受信側が切断した
    ConsumerClosed,
    /// カメラセッションが破棄された（新しいストリームに置き換えられた等）
    SessionClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    pub frames: u64,
    pub detections: u64,
    pub faults: u64,
    pub ended_by: StreamEnd,
}

pub struct StreamWebcamUseCase {
    cameras: Arc<dyn CameraProvider>,
    decoder: Arc<dyn QrDecoder>,
    sessions: Arc<dyn CameraSessionStore>,
    camera_indices: Vec<u32>,
    settings: StreamSettings,
}

impl StreamWebcamUseCase {
    pub fn new(
        cameras: Arc<dyn CameraProvider>,
        decoder: Arc<dyn QrDecoder>,
        sessions: Arc<dyn CameraSessionStore>,
        camera_indices: Vec<u32>,
        settings: StreamSettings,
    ) -> Self {
        Self {
            cameras,
            decoder,
            sessions,
            camera_indices,
            settings,
        }
    }

    /// 候補デバイスを順に試し、最初にフレームを返したデバイスでストリームを開く
    ///
    /// 試し読みしたフレームはストリームの最初のフレームとして処理される。
    pub fn open(&self, session: CameraSessionId) -> Result<WebcamStream, CameraError> {
        for &index in &self.camera_indices {
            let mut source = match self.cameras.open(index) {
                Ok(source) => source,
                Err(e) => {
                    debug!("Capture device {} unavailable: {}", index, e);
                    continue;
                }
            };

            match source.read_frame() {
                Ok(Some(frame)) => {
                    info!(
                        "Using capture device {} for camera session {}",
                        source.describe(),
                        session
                    );
                    return Ok(WebcamStream {
                        source,
                        pending: Some(frame),
                        session,
                        decoder: Arc::clone(&self.decoder),
                        sessions: Arc::clone(&self.sessions),
                        settings: self.settings,
                        frames: 0,
                        detections: 0,
                        faults: 0,
                        corrupt_streak: 0,
                    });
                }
                Ok(None) => debug!("Capture device {} produced no frame", index),
                Err(e) => debug!("Capture device {} failed its first read: {}", index, e),
            }
        }

        warn!(
            "No capture device available via {} provider (probed {:?})",
            self.cameras.name(),
            self.camera_indices
        );
        Err(CameraError::DeviceNotFound(self.camera_indices.clone()))
    }
}

enum Step {
    Emit(Vec<u8>),
    Skip,
    Stop(StreamEnd),
}

/// 開かれたウェブカメラストリーム
///
/// ブロッキングI/Oを行うため `spawn_blocking` 上で `run` することを想定している。
pub struct WebcamStream {
    source: Box<dyn FrameSource>,
    pending: Option<RgbImage>,
    session: CameraSessionId,
    decoder: Arc<dyn QrDecoder>,
    sessions: Arc<dyn CameraSessionStore>,
    settings: StreamSettings,
    frames: u64,
    detections: u64,
    faults: u64,
    corrupt_streak: u32,
}

impl WebcamStream {
    pub fn session(&self) -> CameraSessionId {
        self.session
    }

    pub fn device(&self) -> String {
        self.source.describe()
    }

    /// ソースが尽きるか `sink` が `false` を返すまでフレームを処理する
    pub fn run<F>(mut self, mut sink: F) -> StreamSummary
    where
        F: FnMut(Vec<u8>) -> bool,
    {
        let ended_by = loop {
            let frame = match self.next_frame() {
                Ok(frame) => frame,
                Err(end) => break end,
            };

            match self.process(frame) {
                Step::Emit(chunk) => {
                    if !sink(chunk) {
                        break StreamEnd::ConsumerClosed;
                    }
                }
                Step::Skip => continue,
                Step::Stop(end) => break end,
            }
        };

        let summary = StreamSummary {
            frames: self.frames,
            detections: self.detections,
            faults: self.faults,
            ended_by,
        };
        let device = self.source.describe();
        info!(
            camera_session = %self.session,
            device = %device,
            frames = summary.frames,
            detections = summary.detections,
            faults = summary.faults,
            "Webcam stream ended: {:?}",
            summary.ended_by
        );
        summary
    }

    fn next_frame(&mut self) -> Result<RgbImage, StreamEnd> {
        if let Some(frame) = self.pending.take() {
            return Ok(frame);
        }
        loop {
            match self.source.read_frame() {
                Ok(Some(frame)) => {
                    self.corrupt_streak = 0;
                    return Ok(frame);
                }
                Ok(None) => return Err(StreamEnd::SourceExhausted),
                Err(e)
                    if e.is_recoverable()
                        && self.corrupt_streak < MAX_CONSECUTIVE_CORRUPT_FRAMES =>
                {
                    self.corrupt_streak += 1;
                    debug!("Skipping frame from {}: {}", self.source.describe(), e);
                }
                Err(e) => {
                    info!("Capture device {} stopped: {}", self.source.describe(), e);
                    return Err(StreamEnd::ReadFailed);
                }
            }
        }
    }

    fn process(&mut self, mut frame: RgbImage) -> Step {
        self.frames += 1;

        let outcome = self.decoder.decode(&frame);
        let code = match &outcome {
            DecodeOutcome::Detected(detection) => {
                self.detections += 1;
                if detection.bounds.area() < self.settings.annotation_area_threshold {
                    overlay::annotate(&mut frame, &detection.bounds, &detection.text);
                }
                Some(detection.text.as_str())
            }
            DecodeOutcome::NotFound => None,
            // 一時的なデコード失敗は無視して次のフレームへ進む
            DecodeOutcome::Fault(message) => {
                self.faults += 1;
                debug!("Decoder fault on frame {}: {}", self.frames, message);
                None
            }
        };

        match self.sessions.record(self.session, code) {
            Ok(()) => {}
            Err(SessionError::CameraSessionNotFound(_)) => {
                return Step::Stop(StreamEnd::SessionClosed);
            }
            Err(e) => warn!("Failed to record frame for camera session {}: {}", self.session, e),
        }

        match encode_jpeg(&frame, self.settings.jpeg_quality) {
            Ok(jpeg) => Step::Emit(multipart_chunk(&jpeg)),
            Err(e) => {
                warn!("Dropping frame {}: {}", self.frames, e);
                Step::Skip
            }
        }
    }
}

/// JPEG を multipart のパートとして包む
pub fn multipart_chunk(jpeg: &[u8]) -> Vec<u8> {
    let header = format!("--{FRAME_BOUNDARY}\r\nContent-Type: image/jpeg\r\n\r\n");
    let mut chunk = Vec::with_capacity(header.len() + jpeg.len() + 2);
    chunk.extend_from_slice(header.as_bytes());
    chunk.extend_from_slice(jpeg);
    chunk.extend_from_slice(b"\r\n");
    chunk
}
