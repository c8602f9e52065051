pub mod mock_camera;
pub mod replay_camera;
#[cfg(feature = "v4l2")]
pub mod v4l2_camera;

pub use mock_camera::{ScriptedCamera, ScriptedCameraProvider, UnavailableCameraProvider};
pub use replay_camera::ReplayCameraProvider;
#[cfg(feature = "v4l2")]
pub use v4l2_camera::V4l2CameraProvider;
