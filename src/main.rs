mod cli;

use crate::cli::{Cli, Commands};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use qr_webapp::AppConfig;
use qr_webapp::application::use_cases::{
    DecodeImageUseCase, GenerateQrUseCase, RunApplicationUseCase, StreamSettings,
};
use qr_webapp::debug::{DebugConfig, init_logging, log_error_details};
use qr_webapp::domain::qr::EncodeParameters;
use qr_webapp::infrastructure::qr::{EncoderSettings, QrcodeEncoder, RqrrDecoder};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let verbose = matches!(cli.command, Commands::Run { verbose: true, .. });
    let debug_config = if verbose {
        DebugConfig::development()
    } else {
        DebugConfig::default()
    };
    if let Err(e) = init_logging(&debug_config) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match cli.command {
        Commands::Run {
            port,
            host,
            cameras,
            frames_dir,
            frame_interval_ms,
            camera_session_ttl_secs,
            browser_session_ttl_secs,
            auto_fit,
            jpeg_quality,
            verbose: _,
        } => {
            info!("Starting application...");
            let config = AppConfig {
                host,
                port,
                camera_indices: cameras,
                frames_dir,
                frame_interval: Duration::from_millis(frame_interval_ms),
                camera_session_ttl: Duration::from_secs(camera_session_ttl_secs),
                browser_session_ttl: Duration::from_secs(browser_session_ttl_secs),
                encoder: EncoderSettings { auto_fit },
                stream: StreamSettings {
                    jpeg_quality,
                    ..StreamSettings::default()
                },
                ..AppConfig::default()
            };
            let use_case = RunApplicationUseCase::new(config);

            match use_case.execute().await {
                Ok(_) => {
                    info!("Application terminated normally");
                }
                Err(e) => {
                    error!("Application failed: {}", e);
                    eprintln!("❌ Application failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Encode {
            data,
            box_size,
            border,
            output,
            auto_fit,
        } => {
            if let Err(e) = encode_to_file(&data, box_size, border, &output, auto_fit) {
                eprintln!("❌ Encoding failed: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Decode { path } => match decode_file(&path) {
            Ok(Some(text)) => println!("{text}"),
            Ok(None) => {
                eprintln!("No QR code found in {}", path.display());
                std::process::exit(2);
            }
            Err(e) => {
                eprintln!("❌ Decoding failed: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

fn encode_to_file(
    data: &str,
    box_size: u32,
    border: u32,
    output: &Path,
    auto_fit: bool,
) -> anyhow::Result<()> {
    let params = EncodeParameters::new(box_size, border)?;
    let use_case = GenerateQrUseCase::new(Arc::new(QrcodeEncoder::new(EncoderSettings {
        auto_fit,
    })));

    let generated = use_case.execute(data, params).inspect_err(|e| {
        log_error_details(e, "encode command");
    })?;
    std::fs::write(output, &generated.png)?;

    println!(
        "✅ Wrote {} ({}x{} px)",
        output.display(),
        generated.side,
        generated.side
    );
    Ok(())
}

fn decode_file(path: &Path) -> anyhow::Result<Option<String>> {
    let bytes = std::fs::read(path)?;
    let use_case = DecodeImageUseCase::new(Arc::new(RqrrDecoder::new()));

    let decoded = use_case.execute(&bytes).inspect_err(|e| {
        log_error_details(e, "decode command");
    })?;
    Ok((!decoded.text.is_empty()).then_some(decoded.text))
}
