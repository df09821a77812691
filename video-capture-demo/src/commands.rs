use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use video_capture_core::{
    FileSink, FrameSize, QualitySelector, RecorderHost, SessionConfiguration, SessionControl, SessionState,
};
use video_capture_sim::{ContainerEncoderFactory, SimulatedCameraProvider};

use crate::console_delegate::{ConsoleDelegate, FinishedPayload};

/// Options for `record`, gathered from the command line.
pub struct RecordOptions {
    pub output: Option<PathBuf>,
    pub quality: Option<QualitySelector>,
    pub duration: u64,
    pub surface: FrameSize,
    pub zoom: Option<i32>,
    pub config: Option<PathBuf>,
    pub sidecar: bool,
}

fn default_output() -> PathBuf {
    let dir = PathBuf::from("recordings");
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("clip_{}.vcap", timestamp))
}

fn load_config(path: Option<&PathBuf>) -> Result<SessionConfiguration, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(SessionConfiguration::default());
    };
    let json = fs::read_to_string(path)?;
    Ok(SessionConfiguration::from_json(&json)?)
}

/// Describe the simulated camera and the quality presets.
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let provider = SimulatedCameraProvider::default();
    let spec = provider.spec();

    println!("Available cameras:");
    println!();
    println!("  [0] {} ({})", spec.name, spec.id);
    let sizes: Vec<String> = spec.sizes.iter().map(|s| s.to_string()).collect();
    println!("      Sizes: {}", sizes.join(", "));
    println!("      Zoom:  {}..={}", spec.zoom.min, spec.zoom.max);
    println!();
    println!("Quality presets:");
    for quality in [QualitySelector::High1080p, QualitySelector::Mid720p, QualitySelector::Low480p] {
        let profile = quality.profile();
        println!(
            "  {:>5}  {}@{}fps  {} kbps",
            quality.to_string(),
            profile.frame_size,
            profile.frame_rate,
            profile.video_bitrate / 1000
        );
    }
    Ok(())
}

/// Record one clip with the simulated backend.
pub fn record(options: RecordOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(options.config.as_ref())?;
    if options.sidecar {
        config.write_metadata_sidecar = true;
    }
    let output = options.output.unwrap_or_else(default_output);
    let prepare_timeout = config.prepare_wait_timeout();

    let host = RecorderHost::with_backend(
        SimulatedCameraProvider::default(),
        ContainerEncoderFactory::default(),
        config,
    )?;
    let delegate = ConsoleDelegate::new();
    host.set_observer(delegate.clone());

    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = Arc::clone(&stop_flag);
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    host.on_bind();
    host.surface_available(options.surface);
    host.start_recording(Box::new(FileSink::new(&output)), options.quality)?;

    if !host.session().wait_for_prepare(prepare_timeout) {
        host.on_destroy();
        return Err(format!("preparation did not finish within {:?}", prepare_timeout).into());
    }
    if host.state() != SessionState::Recording {
        let reason = delegate
            .failure()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".into());
        host.on_destroy();
        return Err(format!("recording did not start: {}", reason).into());
    }
    if let Some(params) = delegate.started() {
        log::info!("Recording {} at {} to {}", params.frame_size, params.frame_rate, output.display());
    }

    if let Some(level) = options.zoom {
        let applied = host.set_zoom(level)?;
        log::info!("Zoom set to {}", applied);
    }

    let target = Duration::from_secs(options.duration);
    let started = Instant::now();
    while started.elapsed() < target && !stop_flag.load(Ordering::SeqCst) {
        if host.state() != SessionState::Recording {
            log::warn!("Recording ended early");
            break;
        }
        thread::sleep(Duration::from_millis(100));
    }

    host.stop_recording();
    host.on_unbind();
    host.surface_destroyed();

    let result = host.last_result();
    host.on_destroy();

    let Some(result) = result else {
        return Err("recording produced no result".into());
    };
    println!("{}", serde_json::to_string_pretty(&FinishedPayload::from(&result))?);
    if let Some(error) = result.encoder_error {
        return Err(Box::new(error));
    }
    Ok(())
}
