//! デバッグとログ機能
//!
//! プロジェクト全体のデバッグとログ機能を提供

use std::fs;
use tracing::{debug, error, info, Level};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

/// デバッグ設定
#[derive(Debug, Clone)]
pub struct DebugConfig {
    /// ログレベル
    pub log_level: Level,
    /// ファイルログを有効にするか
    pub enable_file_logging: bool,
    /// ログファイルのディレクトリ
    pub log_directory: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            enable_file_logging: false,
            log_directory: "logs".to_string(),
        }
    }
}

impl DebugConfig {
    /// 開発環境用の設定
    pub fn development() -> Self {
        Self {
            log_level: Level::DEBUG,
            ..Self::default()
        }
    }

    /// 本番環境用の設定
    pub fn production() -> Self {
        Self {
            log_level: Level::INFO,
            enable_file_logging: true,
            log_directory: "/var/log/qr-webapp".to_string(),
        }
    }

    /// テスト環境用の設定
    pub fn test() -> Self {
        Self {
            log_level: Level::WARN,
            enable_file_logging: false,
            log_directory: "test_logs".to_string(),
        }
    }
}

/// ログシステムを初期化
pub fn init_logging(config: &DebugConfig) -> Result<(), Box<dyn std::error::Error>> {
    // 環境変数からのフィルター設定
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("qr_webapp={},tower_http=info", config.log_level)))?;

    if config.enable_file_logging {
        fs::create_dir_all(&config.log_directory)?;
        let file_appender =
            RollingFileAppender::new(Rotation::DAILY, &config.log_directory, "qr-webapp.log");

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(file_appender)
            .json()
            .try_init()
            .map_err(|e| e as Box<dyn std::error::Error>)?;
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .pretty()
            .with_target(true)
            .with_thread_names(true)
            .try_init()
            .map_err(|e| e as Box<dyn std::error::Error>)?;
    }

    info!("ログシステムが初期化されました");
    debug!("デバッグ設定: {:?}", config);

    Ok(())
}

/// エラーの詳細情報をログに出力
pub fn log_error_details(error: &dyn std::error::Error, context: &str) {
    error!(context = context, error = %error, "エラーが発生しました");

    // エラーチェーンをログに出力
    let mut source = error.source();
    let mut level = 1;
    while let Some(err) = source {
        error!(context = context, level = level, source_error = %err, "エラーの原因");
        source = err.source();
        level += 1;
    }
}

/// パフォーマンス測定用のマクロ
#[macro_export]
macro_rules! measure_time {
    ($name:expr, $block:block) => {{
        let start = std::time::Instant::now();
        let result = $block;
        let duration = start.elapsed();
        tracing::debug!(
            operation = $name,
            duration_ms = duration.as_millis() as u64,
            "操作完了"
        );
        result
    }};
}
