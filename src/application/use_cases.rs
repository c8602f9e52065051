pub mod decode_image;
pub mod generate_qr;
pub mod run_application;
pub mod stream_webcam;
pub mod webcam_session;

pub use decode_image::{DecodeImageUseCase, DecodedImage};
pub use generate_qr::{GenerateQrUseCase, GeneratedQr};
pub use run_application::RunApplicationUseCase;
pub use stream_webcam::{StreamEnd, StreamSettings, StreamSummary, StreamWebcamUseCase, WebcamStream};
pub use webcam_session::WebcamSessionUseCase;
