//! ドメイン層
//!
//! ビジネスロジックとドメインモデルを含む層

pub mod camera;
pub mod qr;
pub mod session;
