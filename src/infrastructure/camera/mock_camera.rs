use crate::domain::camera::{CameraError, CameraProvider, FrameSource};
use image::RgbImage;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info};

/// 決められたフレーム列を1回だけ再生するカメラ
pub struct ScriptedCamera {
    name: String,
    frames: VecDeque<RgbImage>,
}

impl ScriptedCamera {
    pub fn new(name: impl Into<String>, frames: Vec<RgbImage>) -> Self {
        Self {
            name: name.into(),
            frames: frames.into(),
        }
    }
}

impl FrameSource for ScriptedCamera {
    fn read_frame(&mut self) -> Result<Option<RgbImage>, CameraError> {
        Ok(self.frames.pop_front())
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// デバイス番号ごとにフレーム列を割り当てるプロバイダ
#[derive(Default)]
pub struct ScriptedCameraProvider {
    devices: HashMap<u32, Vec<RgbImage>>,
}

impl ScriptedCameraProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(mut self, index: u32, frames: Vec<RgbImage>) -> Self {
        self.devices.insert(index, frames);
        self
    }
}

impl CameraProvider for ScriptedCameraProvider {
    fn open(&self, index: u32) -> Result<Box<dyn FrameSource>, CameraError> {
        match self.devices.get(&index) {
            Some(frames) => {
                debug!("Opening scripted camera {} ({} frames)", index, frames.len());
                Ok(Box::new(ScriptedCamera::new(
                    format!("scripted:{index}"),
                    frames.clone(),
                )))
            }
            None => Err(CameraError::OpenFailed {
                index,
                message: "no scripted device".to_string(),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// キャプチャデバイスが設定されていない場合のプロバイダ
#[derive(Debug, Default)]
pub struct UnavailableCameraProvider;

impl UnavailableCameraProvider {
    pub fn new() -> Self {
        info!("No capture backend configured; webcam streams will report no device");
        Self
    }
}

impl CameraProvider for UnavailableCameraProvider {
    fn open(&self, index: u32) -> Result<Box<dyn FrameSource>, CameraError> {
        Err(CameraError::OpenFailed {
            index,
            message: "no capture backend configured".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_scripted_camera_ends_after_frames() {
        let frame = RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]));
        let provider = ScriptedCameraProvider::new().with_device(1, vec![frame.clone(), frame]);

        assert!(provider.open(0).is_err());

        let mut camera = provider.open(1).unwrap();
        assert_eq!(camera.describe(), "scripted:1");
        assert!(camera.read_frame().unwrap().is_some());
        assert!(camera.read_frame().unwrap().is_some());
        assert!(camera.read_frame().unwrap().is_none());

        // 開き直すと最初から再生される
        let mut reopened = provider.open(1).unwrap();
        assert!(reopened.read_frame().unwrap().is_some());
    }

    #[test]
    fn test_unavailable_provider_never_opens() {
        let provider = UnavailableCameraProvider::new();
        for index in 0..3 {
            assert!(matches!(
                provider.open(index),
                Err(CameraError::OpenFailed { .. })
            ));
        }
    }
}
