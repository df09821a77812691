//! Container-writing encoder.
//!
//! Produces synthetic frames at the negotiated frame rate on a dedicated
//! thread and writes them into a `VCAP` container through the sink given at
//! configuration time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use video_capture_core::models::error::CaptureError;
use video_capture_core::models::recording_result::EncoderSummary;
use video_capture_core::models::state::EncoderState;
use video_capture_core::models::video_models::{CaptureParameters, FrameSize, QualityProfile};
use video_capture_core::processing::container::ContainerHeader;
use video_capture_core::storage::container_writer::ContainerWriter;
use video_capture_core::storage::sink::MediaSink;
use video_capture_core::traits::encoder_session::{EncoderFactory, EncoderFaultCallback, EncoderSession};

/// Tuning knobs for the simulated encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderSettings {
    /// Size of each synthetic frame payload.
    pub payload_bytes: usize,
    /// Stop producing frames after this many (the thread idles until stopped).
    pub max_frames: Option<u64>,
    /// Raise a fault after this many frames.
    pub fail_after_frames: Option<u64>,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            payload_bytes: 256,
            max_frames: None,
            fail_after_frames: None,
        }
    }
}

/// Creates a fresh `ContainerEncoder` per recording attempt.
#[derive(Debug, Clone, Default)]
pub struct ContainerEncoderFactory {
    settings: EncoderSettings,
}

impl ContainerEncoderFactory {
    pub fn new(settings: EncoderSettings) -> Self {
        Self { settings }
    }
}

impl EncoderFactory for ContainerEncoderFactory {
    type Encoder = ContainerEncoder;

    fn create(&self) -> ContainerEncoder {
        ContainerEncoder::new(self.settings.clone())
    }
}

/// What the frame thread hands back when it exits.
struct FrameLoopOutcome {
    writer: ContainerWriter,
    frames: u64,
}

/// Encoder writing synthetic frames into a `VCAP` container.
pub struct ContainerEncoder {
    settings: EncoderSettings,
    state: EncoderState,
    profile: Option<QualityProfile>,
    writer: Option<ContainerWriter>,
    running: Arc<AtomicBool>,
    frame_thread: Option<thread::JoinHandle<FrameLoopOutcome>>,
}

impl ContainerEncoder {
    pub fn new(settings: EncoderSettings) -> Self {
        Self {
            settings,
            state: EncoderState::Unconfigured,
            profile: None,
            writer: None,
            running: Arc::new(AtomicBool::new(false)),
            frame_thread: None,
        }
    }

    fn expect_state(&self, expected: EncoderState, operation: &str) -> Result<(), CaptureError> {
        if self.state != expected {
            return Err(CaptureError::EncoderConfigInvalid(format!(
                "{} called in state {:?}",
                operation, self.state
            )));
        }
        Ok(())
    }

    /// Signal the frame thread and wait for it to hand the writer back.
    fn join_frame_thread(&mut self) -> Result<Option<FrameLoopOutcome>, CaptureError> {
        self.running.store(false, Ordering::SeqCst);
        let Some(handle) = self.frame_thread.take() else {
            return Ok(None);
        };
        handle
            .join()
            .map(Some)
            .map_err(|_| CaptureError::EncoderFault("frame thread panicked".into()))
    }
}

impl EncoderSession for ContainerEncoder {
    fn state(&self) -> EncoderState {
        self.state
    }

    fn configure(
        &mut self,
        source: &CaptureParameters,
        profile: &QualityProfile,
        mut sink: Box<dyn MediaSink>,
    ) -> Result<(), CaptureError> {
        self.expect_state(EncoderState::Unconfigured, "configure")?;
        if source.frame_size != profile.frame_size {
            return Err(CaptureError::EncoderConfigInvalid(format!(
                "source {} does not match profile {}",
                source.frame_size, profile.frame_size
            )));
        }
        if profile.frame_rate == 0 || profile.frame_size.is_empty() {
            return Err(CaptureError::EncoderConfigInvalid(format!(
                "unusable profile {} @ {}fps",
                profile.frame_size, profile.frame_rate
            )));
        }

        let destination = sink.describe();
        let stream = sink.open()?;
        self.writer = Some(ContainerWriter::new(stream, ContainerHeader::for_profile(profile)));
        self.profile = Some(*profile);
        self.state = EncoderState::Configured;
        log::debug!("Encoder configured: {} ({}) → {}", profile.frame_size, profile.quality, destination);
        Ok(())
    }

    fn prepare(&mut self) -> Result<(), CaptureError> {
        self.expect_state(EncoderState::Configured, "prepare")?;
        let Some(writer) = self.writer.as_mut() else {
            return Err(CaptureError::EncoderConfigInvalid("no destination configured".into()));
        };
        writer.open()?;
        self.state = EncoderState::Prepared;
        Ok(())
    }

    fn start(&mut self, on_fault: EncoderFaultCallback) -> Result<(), CaptureError> {
        self.expect_state(EncoderState::Prepared, "start")?;
        let (Some(profile), Some(writer)) = (self.profile, self.writer.take()) else {
            return Err(CaptureError::EncoderConfigInvalid("encoder not prepared".into()));
        };

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let settings = self.settings.clone();

        let handle = thread::Builder::new()
            .name("sim-encoder".into())
            .spawn(move || frame_loop(running, writer, profile, settings, on_fault))
            .map_err(|e| CaptureError::EncoderConfigInvalid(format!("failed to spawn encoder thread: {}", e)))?;

        self.frame_thread = Some(handle);
        self.state = EncoderState::Running;
        Ok(())
    }

    fn stop(&mut self) -> Result<EncoderSummary, CaptureError> {
        self.expect_state(EncoderState::Running, "stop")?;
        self.state = EncoderState::Stopped;

        let Some(FrameLoopOutcome { mut writer, frames }) = self.join_frame_thread()? else {
            return Err(CaptureError::EncoderFault("frame thread missing".into()));
        };
        let frame_rate = self.profile.map(|p| p.frame_rate).unwrap_or(1).max(1);
        let duration_ms = frames * 1000 / u64::from(frame_rate);

        let summary = writer.close(duration_ms)?;
        log::info!(
            "Encoder finalized {} frames ({} bytes, sha256 {})",
            summary.frame_count,
            summary.bytes_written,
            summary.checksum
        );
        Ok(summary)
    }

    fn release(&mut self) -> Result<(), CaptureError> {
        if self.state == EncoderState::Released {
            return Ok(());
        }
        let joined = self.join_frame_thread();
        self.writer = None;
        self.state = EncoderState::Released;
        joined.map(|_| ())
    }
}

impl Drop for ContainerEncoder {
    fn drop(&mut self) {
        let _ = self.join_frame_thread();
    }
}

/// Frame production loop running on the encoder thread.
fn frame_loop(
    running: Arc<AtomicBool>,
    mut writer: ContainerWriter,
    profile: QualityProfile,
    settings: EncoderSettings,
    on_fault: EncoderFaultCallback,
) -> FrameLoopOutcome {
    let interval = Duration::from_secs(1) / profile.frame_rate.max(1);
    let frame_us = 1_000_000 / u64::from(profile.frame_rate.max(1));
    let started = Instant::now();
    let mut frames: u64 = 0;

    while running.load(Ordering::SeqCst) {
        if settings.fail_after_frames == Some(frames) {
            log::error!("Simulated encoder fault after {} frames", frames);
            on_fault(CaptureError::EncoderFault(format!("simulated fault after {} frames", frames)));
            break;
        }
        if settings.max_frames.is_some_and(|max| frames >= max) {
            thread::sleep(Duration::from_millis(5));
            continue;
        }

        let payload = synthetic_frame(frames, profile.frame_size, settings.payload_bytes);
        if let Err(e) = writer.write_frame(frames * frame_us, &payload) {
            log::error!("Encoder write failed: {}", e);
            on_fault(e);
            break;
        }
        frames += 1;

        // Pace against the start time so sleep jitter does not accumulate.
        let next = started + interval * u32::try_from(frames).unwrap_or(u32::MAX);
        let now = Instant::now();
        if next > now {
            thread::sleep(next - now);
        }
    }

    FrameLoopOutcome { writer, frames }
}

/// Deterministic frame payload: index, dimensions, then a byte ramp.
pub fn synthetic_frame(index: u64, size: FrameSize, len: usize) -> Vec<u8> {
    let mut payload = Vec::with_capacity(len.max(16));
    payload.extend_from_slice(&index.to_le_bytes());
    payload.extend_from_slice(&size.width.to_le_bytes());
    payload.extend_from_slice(&size.height.to_le_bytes());
    let mut value = index as u8;
    while payload.len() < len {
        payload.push(value);
        value = value.wrapping_add(1);
    }
    payload
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use approx::assert_relative_eq;
    use parking_lot::Mutex;
    use video_capture_core::models::video_models::{FocusMode, QualitySelector};
    use video_capture_core::processing::container::read_container;
    use video_capture_core::storage::sink::MemorySink;

    use super::*;

    fn source(profile: &QualityProfile) -> CaptureParameters {
        CaptureParameters {
            frame_size: profile.frame_size,
            frame_rate: profile.frame_rate,
            zoom: 0,
            focus_mode: FocusMode::Auto,
        }
    }

    fn no_fault() -> EncoderFaultCallback {
        Arc::new(|_: CaptureError| {})
    }

    fn running_encoder(settings: EncoderSettings, sink: &MemorySink) -> ContainerEncoder {
        let profile = QualitySelector::Low480p.profile();
        let mut encoder = ContainerEncoder::new(settings);
        encoder.configure(&source(&profile), &profile, Box::new(sink.clone())).unwrap();
        encoder.prepare().unwrap();
        encoder.start(no_fault()).unwrap();
        encoder
    }

    #[test]
    fn test_writes_readable_container() {
        let sink = MemorySink::new("mem");
        let mut encoder = running_encoder(EncoderSettings::default(), &sink);
        assert_eq!(encoder.state(), EncoderState::Running);

        thread::sleep(Duration::from_millis(150));
        let summary = encoder.stop().unwrap();
        encoder.release().unwrap();

        let (header, frames) = read_container(&sink.contents()).unwrap();
        assert!(summary.frame_count > 0);
        assert_eq!(frames.len() as u64, summary.frame_count);
        assert_eq!(u64::from(header.frame_count), summary.frame_count);
        assert_eq!(header.frame_size, FrameSize::new(720, 480));
        assert_eq!(summary.bytes_written, sink.len() as u64);
        assert_eq!(summary.checksum.len(), 64);
        assert_eq!(frames[0].payload, synthetic_frame(0, FrameSize::new(720, 480), 256));
        assert!(frames.windows(2).all(|w| w[0].pts_us < w[1].pts_us));
    }

    #[test]
    fn test_stop_with_zero_frames() {
        let sink = MemorySink::new("mem");
        let settings = EncoderSettings {
            max_frames: Some(0),
            ..EncoderSettings::default()
        };
        let mut encoder = running_encoder(settings, &sink);

        let summary = encoder.stop().unwrap();
        assert_eq!(summary.frame_count, 0);
        assert_relative_eq!(summary.duration_secs, 0.0);

        let (header, frames) = read_container(&sink.contents()).unwrap();
        assert_eq!(header.frame_count, 0);
        assert!(frames.is_empty());
    }

    #[test]
    fn test_max_frames_caps_output() {
        let sink = MemorySink::new("mem");
        let settings = EncoderSettings {
            max_frames: Some(3),
            payload_bytes: 32,
            ..EncoderSettings::default()
        };
        let mut encoder = running_encoder(settings, &sink);
        thread::sleep(Duration::from_millis(250));

        let summary = encoder.stop().unwrap();
        assert_eq!(summary.frame_count, 3);
        assert_relative_eq!(summary.duration_secs, 0.1);
    }

    #[test]
    fn test_enforces_call_order() {
        let profile = QualitySelector::Mid720p.profile();
        let mut encoder = ContainerEncoder::new(EncoderSettings::default());

        assert!(matches!(encoder.prepare(), Err(CaptureError::EncoderConfigInvalid(_))));
        assert!(matches!(encoder.start(no_fault()), Err(CaptureError::EncoderConfigInvalid(_))));
        assert!(matches!(encoder.stop(), Err(CaptureError::EncoderConfigInvalid(_))));

        encoder
            .configure(&source(&profile), &profile, Box::new(MemorySink::new("mem")))
            .unwrap();
        assert_eq!(encoder.state(), EncoderState::Configured);
        assert!(encoder
            .configure(&source(&profile), &profile, Box::new(MemorySink::new("again")))
            .is_err());

        encoder.release().unwrap();
        encoder.release().unwrap();
        assert_eq!(encoder.state(), EncoderState::Released);
        assert!(encoder.prepare().is_err());
    }

    #[test]
    fn test_rejects_mismatched_source() {
        let profile = QualitySelector::High1080p.profile();
        let mut wrong = source(&profile);
        wrong.frame_size = FrameSize::new(1280, 720);

        let mut encoder = ContainerEncoder::new(EncoderSettings::default());
        let err = encoder
            .configure(&wrong, &profile, Box::new(MemorySink::new("mem")))
            .unwrap_err();
        assert!(matches!(err, CaptureError::EncoderConfigInvalid(_)));
        assert_eq!(encoder.state(), EncoderState::Unconfigured);
    }

    #[test]
    fn test_fault_is_reported_and_output_finalized() {
        let sink = MemorySink::new("mem");
        let profile = QualitySelector::Low480p.profile();
        let settings = EncoderSettings {
            fail_after_frames: Some(2),
            ..EncoderSettings::default()
        };
        let mut encoder = ContainerEncoder::new(settings);
        encoder.configure(&source(&profile), &profile, Box::new(sink.clone())).unwrap();
        encoder.prepare().unwrap();

        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        encoder
            .start(Arc::new(move |error: CaptureError| {
                let _ = tx.lock().send(error);
            }))
            .unwrap();

        let fault = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(matches!(fault, CaptureError::EncoderFault(_)));

        let summary = encoder.stop().unwrap();
        assert_eq!(summary.frame_count, 2);
        let (_, frames) = read_container(&sink.contents()).unwrap();
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn test_release_while_running_stops_thread() {
        let sink = MemorySink::new("mem");
        let mut encoder = running_encoder(EncoderSettings::default(), &sink);
        encoder.release().unwrap();
        assert_eq!(encoder.state(), EncoderState::Released);
        assert!(encoder.stop().is_err());
    }
}
