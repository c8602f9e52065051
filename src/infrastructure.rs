//! インフラストラクチャ層
//!
//! 外部クレートやデバイスとの統合

pub mod camera;
pub mod imaging;
pub mod qr;
pub mod session;
