pub mod qrcode_encoder;
pub mod rqrr_decoder;

pub use qrcode_encoder::{EncoderSettings, QrcodeEncoder};
pub use rqrr_decoder::RqrrDecoder;
