//! V4L2 キャプチャデバイス (`/dev/video<N>`)
//!
//! MJPEG フォーマットでメモリマップドストリームを開き、
//! 各フレームを `image` でデコードする。

use crate::domain::camera::{CameraError, CameraProvider, FrameSource};
use image::{ImageFormat, RgbImage};
use tracing::{debug, info};
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

const BUFFER_COUNT: u32 = 4;

#[derive(Debug, Default)]
pub struct V4l2CameraProvider;

impl V4l2CameraProvider {
    pub fn new() -> Self {
        Self
    }
}

impl CameraProvider for V4l2CameraProvider {
    fn open(&self, index: u32) -> Result<Box<dyn FrameSource>, CameraError> {
        let open_failed = |e: std::io::Error| CameraError::OpenFailed {
            index,
            message: e.to_string(),
        };

        let device = Device::new(index as usize).map_err(open_failed)?;

        let mjpeg = FourCC::new(b"MJPG");
        let mut format = device.format().map_err(open_failed)?;
        format.fourcc = mjpeg;
        let format = device.set_format(&format).map_err(open_failed)?;
        if format.fourcc != mjpeg {
            return Err(CameraError::UnsupportedFormat(format.fourcc.to_string()));
        }

        info!(
            "Opened /dev/video{} ({}x{} {})",
            index, format.width, format.height, format.fourcc
        );

        let stream = Stream::with_buffers(&device, Type::VideoCapture, BUFFER_COUNT)
            .map_err(open_failed)?;

        Ok(Box::new(V4l2Source {
            index,
            stream,
            _device: device,
        }))
    }

    fn name(&self) -> &'static str {
        "v4l2"
    }
}

struct V4l2Source {
    index: u32,
    stream: Stream<'static>,
    // ストリームより長く生存させる
    _device: Device,
}

impl FrameSource for V4l2Source {
    fn read_frame(&mut self) -> Result<Option<RgbImage>, CameraError> {
        let (buffer, meta) = self
            .stream
            .next()
            .map_err(|e| CameraError::ReadFailed(e.to_string()))?;
        debug!("Captured frame seq={} bytes={}", meta.sequence, meta.bytesused);

        let used = (meta.bytesused as usize).min(buffer.len());
        let frame = image::load_from_memory_with_format(&buffer[..used], ImageFormat::Jpeg)
            .map_err(|e| CameraError::CorruptFrame(e.to_string()))?;
        Ok(Some(frame.to_rgb8()))
    }

    fn describe(&self) -> String {
        format!("/dev/video{}", self.index)
    }
}
