//! アプリケーション層
//!
//! ユースケースを含む層

pub mod use_cases;
