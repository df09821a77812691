use std::io::{Read, Seek, SeekFrom, Write};

use sha2::{Digest, Sha256};

use crate::models::error::CaptureError;
use crate::models::recording_result::EncoderSummary;
use crate::processing::container::{self, ContainerHeader};
use crate::storage::sink::SinkWriter;

/// Streaming `VCAP` container writer.
///
/// Writes the header with zero counts on `open`, appends frame records, and
/// on `close` patches frame count and duration in place, then checksums the
/// finished container.
///
/// ```text
/// [40-byte header]
/// [frame 1: 4-byte len | 8-byte pts | payload]
/// [frame 2: ...]
/// ```
pub struct ContainerWriter {
    writer: Box<dyn SinkWriter>,
    header: ContainerHeader,
    frame_count: u32,
    total_bytes_written: u64,
    is_open: bool,
    is_closed: bool,
}

impl ContainerWriter {
    pub fn new(writer: Box<dyn SinkWriter>, header: ContainerHeader) -> Self {
        Self {
            writer,
            header,
            frame_count: 0,
            total_bytes_written: 0,
            is_open: false,
            is_closed: false,
        }
    }

    /// Write the initial header.
    pub fn open(&mut self) -> Result<(), CaptureError> {
        if self.is_open {
            return Ok(());
        }
        if self.is_closed {
            return Err(CaptureError::SinkIo("container already finalized".into()));
        }
        let header = container::generate_header(&self.header);
        self.write_raw(&header)?;
        self.is_open = true;
        Ok(())
    }

    /// Append one frame record.
    pub fn write_frame(&mut self, pts_us: u64, payload: &[u8]) -> Result<(), CaptureError> {
        if !self.is_open {
            return Err(CaptureError::SinkIo("container is not open for writing".into()));
        }
        let record = container::encode_frame_record(pts_us, payload);
        self.write_raw(&record)?;
        self.frame_count += 1;
        Ok(())
    }

    /// Finalize: patch counts, flush, checksum.
    pub fn close(&mut self, duration_ms: u64) -> Result<EncoderSummary, CaptureError> {
        if !self.is_open {
            return Err(CaptureError::SinkIo("container is not open".into()));
        }

        self.writer.seek(SeekFrom::Start(container::FRAME_COUNT_OFFSET))?;
        self.writer.write_all(&self.frame_count.to_le_bytes())?;
        self.writer.seek(SeekFrom::Start(container::DURATION_OFFSET))?;
        self.writer.write_all(&duration_ms.to_le_bytes())?;
        self.writer.flush()?;

        self.header.frame_count = self.frame_count;
        self.header.duration_ms = duration_ms;
        self.is_open = false;
        self.is_closed = true;

        let checksum = self.checksum()?;
        Ok(EncoderSummary {
            frame_count: self.frame_count as u64,
            duration_secs: duration_ms as f64 / 1000.0,
            bytes_written: self.total_bytes_written,
            checksum,
        })
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Total bytes written so far (including the header).
    pub fn bytes_written(&self) -> u64 {
        self.total_bytes_written
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), CaptureError> {
        self.writer
            .write_all(data)
            .map_err(|e| CaptureError::SinkIo(format!("write failed: {}", e)))?;
        self.total_bytes_written += data.len() as u64;
        Ok(())
    }

    /// SHA-256 hex digest of the container as stored in the sink.
    fn checksum(&mut self) -> Result<String, CaptureError> {
        self.writer.seek(SeekFrom::Start(0))?;
        let mut hasher = Sha256::new();
        let mut chunk = [0u8; 8192];
        loop {
            let n = self.writer.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            hasher.update(&chunk[..n]);
        }
        Ok(hex_encode(&hasher.finalize()))
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
