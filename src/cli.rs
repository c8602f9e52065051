use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "qr-webapp",
    version,
    about = "Generate QR codes and read them from images or a webcam",
    long_about = "A small web application that renders QR codes from text, decodes uploaded images, and reads codes live from a webcam stream"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the web server
    Run {
        /// Port to bind the web server to
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Host to bind the web server to
        #[arg(short = 'H', long, default_value = "0.0.0.0")]
        host: String,
        /// Capture device index to probe (repeatable, probed in order)
        #[arg(short, long = "camera", default_values_t = [0u32, 1, 2])]
        cameras: Vec<u32>,
        /// Replay the images in this directory instead of a capture device
        #[arg(long)]
        frames_dir: Option<PathBuf>,
        /// Delay between replayed frames in milliseconds
        #[arg(long, default_value = "100")]
        frame_interval_ms: u64,
        /// Evict camera sessions idle for longer than this
        #[arg(long, default_value = "1800")]
        camera_session_ttl_secs: u64,
        /// Evict browser sessions idle for longer than this
        #[arg(long, default_value = "1800")]
        browser_session_ttl_secs: u64,
        /// Pick the smallest QR version that fits instead of rejecting long data
        #[arg(long)]
        auto_fit: bool,
        /// JPEG quality of streamed frames (1-100)
        #[arg(long, default_value = "80", value_parser = clap::value_parser!(u8).range(1..=100))]
        jpeg_quality: u8,
        /// Enable debug logging
        #[arg(short, long)]
        verbose: bool,
    },
    /// Write a QR code PNG
    Encode {
        /// Text to encode
        #[arg(short, long)]
        data: String,
        /// Pixels per module (1-50)
        #[arg(long, default_value = "10")]
        box_size: u32,
        /// Quiet zone width in modules (1-10)
        #[arg(long, default_value = "4")]
        border: u32,
        /// Output PNG path
        #[arg(short, long, default_value = "qr.png")]
        output: PathBuf,
        /// Pick the smallest QR version that fits instead of rejecting long data
        #[arg(long)]
        auto_fit: bool,
    },
    /// Read a QR code from an image file
    Decode {
        /// Image file (PNG or JPEG)
        path: PathBuf,
    },
}
