//! ディレクトリ内の画像をカメラとして再生する
//!
//! 実機のカメラがない環境での動作確認用

use crate::domain::camera::{CameraError, CameraProvider, FrameSource};
use crate::infrastructure::imaging::load_rgb;
use image::RgbImage;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct ReplayCameraProvider {
    directory: PathBuf,
    interval: Duration,
}

impl ReplayCameraProvider {
    pub fn new(directory: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            directory: directory.into(),
            interval,
        }
    }

    /// 名前順に並べた画像をすべて読み込む。読めないファイルは飛ばす
    fn load_frames(&self) -> Result<Vec<RgbImage>, CameraError> {
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.directory)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        let mut frames = Vec::with_capacity(paths.len());
        for path in paths {
            match read_image(&path) {
                Ok(frame) => frames.push(frame),
                Err(e) => warn!("Skipping replay frame {}: {}", path.display(), e),
            }
        }
        Ok(frames)
    }
}

impl CameraProvider for ReplayCameraProvider {
    fn open(&self, index: u32) -> Result<Box<dyn FrameSource>, CameraError> {
        let frames = self.load_frames().map_err(|e| CameraError::OpenFailed {
            index,
            message: e.to_string(),
        })?;

        if frames.is_empty() {
            return Err(CameraError::OpenFailed {
                index,
                message: format!("no readable images in {}", self.directory.display()),
            });
        }

        info!(
            "Replaying {} frames from {} as device {}",
            frames.len(),
            self.directory.display(),
            index
        );

        Ok(Box::new(ReplaySource {
            name: format!("replay:{}#{}", self.directory.display(), index),
            frames,
            position: 0,
            interval: self.interval,
        }))
    }

    fn name(&self) -> &'static str {
        "replay"
    }
}

/// フレームを繰り返し再生するソース
struct ReplaySource {
    name: String,
    frames: Vec<RgbImage>,
    position: usize,
    interval: Duration,
}

impl FrameSource for ReplaySource {
    fn read_frame(&mut self) -> Result<Option<RgbImage>, CameraError> {
        if self.position > 0 && !self.interval.is_zero() {
            thread::sleep(self.interval);
        }

        let frame = self.frames[self.position % self.frames.len()].clone();
        self.position += 1;
        debug!("Replay frame {}", self.position);
        Ok(Some(frame))
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

fn read_image(path: &Path) -> Result<RgbImage, CameraError> {
    let bytes = fs::read(path)?;
    load_rgb(&bytes).map_err(|e| CameraError::ReadFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::imaging::encode_png;
    use image::{GrayImage, Luma};

    fn write_png(dir: &Path, name: &str, value: u8) {
        let png = encode_png(GrayImage::from_pixel(8, 8, Luma([value]))).unwrap();
        fs::write(dir.join(name), png).unwrap();
    }

    #[test]
    fn test_replay_loops_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "b.png", 200);
        write_png(dir.path(), "a.png", 10);
        fs::write(dir.path().join("notes.txt"), "not an image").unwrap();

        let provider = ReplayCameraProvider::new(dir.path(), Duration::ZERO);
        let mut source = provider.open(0).unwrap();

        let values: Vec<u8> = (0..4)
            .map(|_| source.read_frame().unwrap().unwrap().get_pixel(0, 0).0[0])
            .collect();
        assert_eq!(values, vec![10, 200, 10, 200]);
    }

    #[test]
    fn test_replay_without_images_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ReplayCameraProvider::new(dir.path(), Duration::ZERO);
        assert!(matches!(
            provider.open(2),
            Err(CameraError::OpenFailed { index: 2, .. })
        ));

        let missing = ReplayCameraProvider::new(dir.path().join("missing"), Duration::ZERO);
        assert!(missing.open(0).is_err());
    }
}
