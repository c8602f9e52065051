use crate::domain::qr::{BoundingQuad, DecodeOutcome, PixelPoint, QrDecoder, QrDetection};
use image::{GrayImage, RgbImage};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

/// `rqrr` クレートによるデコーダー
#[derive(Debug, Default)]
pub struct RqrrDecoder;

impl RqrrDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl QrDecoder for RqrrDecoder {
    fn decode(&self, frame: &RgbImage) -> DecodeOutcome {
        let gray = image::imageops::grayscale(frame);

        // 壊れたバッファで検出器がpanicしてもフレーム単位の障害として扱う
        match panic::catch_unwind(AssertUnwindSafe(|| detect(&gray))) {
            Ok(outcome) => outcome,
            Err(payload) => DecodeOutcome::Fault(panic_message(payload.as_ref())),
        }
    }
}

fn detect(gray: &GrayImage) -> DecodeOutcome {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return DecodeOutcome::NotFound;
    }

    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
            gray.get_pixel(x as u32, y as u32).0[0]
        });
    let grids = prepared.detect_grids();

    let mut undecoded = None;
    for grid in &grids {
        let bounds = to_quad(&grid.bounds);
        match grid.decode() {
            Ok((_, text)) => return DecodeOutcome::Detected(QrDetection { text, bounds }),
            Err(e) => {
                debug!("Located QR grid but decoding failed: {}", e);
                undecoded.get_or_insert(bounds);
            }
        }
    }

    // 位置は分かったが読めなかった場合は空文字列として報告する
    match undecoded {
        Some(bounds) => DecodeOutcome::Detected(QrDetection {
            text: String::new(),
            bounds,
        }),
        None => DecodeOutcome::NotFound,
    }
}

fn to_quad(points: &[rqrr::Point; 4]) -> BoundingQuad {
    BoundingQuad::new(points.map(|p| PixelPoint::new(p.x, p.y)))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "decoder panicked".to_string()
    }
}
