mod commands;
mod console_delegate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use video_capture_core::{FrameSize, QualitySelector};

#[derive(Parser)]
#[command(name = "video-capture-demo")]
#[command(about = "Drive a capture session against the simulated camera")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the simulated camera and the quality presets
    List,

    /// Record a clip into a VCAP container
    Record {
        /// Output file path (default: ./recordings/clip_TIMESTAMP.vcap)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Quality preset: 1080p, 720p or 480p (default: from configuration)
        #[arg(short, long, value_parser = parse_quality)]
        quality: Option<QualitySelector>,

        /// Recording duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,

        /// Preview surface size, WIDTHxHEIGHT
        #[arg(short, long, default_value = "1280x720", value_parser = parse_size)]
        surface: FrameSize,

        /// Zoom level to apply once recording
        #[arg(short, long, allow_negative_numbers = true)]
        zoom: Option<i32>,

        /// JSON session configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write a .metadata.json sidecar next to the recording
        #[arg(long)]
        sidecar: bool,
    },
}

fn parse_quality(value: &str) -> Result<QualitySelector, String> {
    match value.to_ascii_lowercase().as_str() {
        "1080p" | "high" => Ok(QualitySelector::High1080p),
        "720p" | "mid" => Ok(QualitySelector::Mid720p),
        "480p" | "low" => Ok(QualitySelector::Low480p),
        other => Err(format!("unknown quality '{}'", other)),
    }
}

fn parse_size(value: &str) -> Result<FrameSize, String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
    let width = width.trim().parse().map_err(|e| format!("bad width: {}", e))?;
    let height = height.trim().parse().map_err(|e| format!("bad height: {}", e))?;
    Ok(FrameSize::new(width, height))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control log level, e.g. RUST_LOG=video_capture_core=debug
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List => commands::list_cameras(),
        Commands::Record {
            output,
            quality,
            duration,
            surface,
            zoom,
            config,
            sidecar,
        } => commands::record(commands::RecordOptions {
            output,
            quality,
            duration,
            surface,
            zoom,
            config,
            sidecar,
        }),
    }
}
