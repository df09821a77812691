use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

/// Byte stream an encoder writes its container into.
///
/// Seekable so headers can be patched on finalize, readable so the finished
/// container can be checksummed.
pub trait SinkWriter: Read + Write + Seek + Send {}

impl<T: Read + Write + Seek + Send> SinkWriter for T {}

/// Abstract writable destination for a finished media file.
///
/// The host supplies a sink with each recording request; the encoder opens
/// it during configuration.
pub trait MediaSink: Send {
    /// Open the destination for writing, truncating previous content.
    fn open(&mut self) -> io::Result<Box<dyn SinkWriter>>;

    /// Human-readable description used in logs and results.
    fn describe(&self) -> String;

    /// Filesystem location, if the sink is file-backed.
    fn path(&self) -> Option<&Path> {
        None
    }
}

/// File-backed sink.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MediaSink for FileSink {
    fn open(&mut self) -> io::Result<Box<dyn SinkWriter>> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file: File = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;
        Ok(Box::new(file))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// In-memory sink. Clones share the same buffer, so the caller keeps a clone
/// to inspect what the encoder wrote.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
    label: String,
}

impl MemorySink {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(Vec::new())),
            label: label.into(),
        }
    }

    /// Snapshot of the bytes written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.buffer.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MediaSink for MemorySink {
    fn open(&mut self) -> io::Result<Box<dyn SinkWriter>> {
        self.buffer.lock().clear();
        Ok(Box::new(SharedBufferWriter {
            buffer: Arc::clone(&self.buffer),
            position: 0,
        }))
    }

    fn describe(&self) -> String {
        format!("memory:{}", self.label)
    }
}

/// Cursor over a shared buffer.
struct SharedBufferWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
    position: u64,
}

impl Write for SharedBufferWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut buf = self.buffer.lock();
        let start = self.position as usize;
        let end = start + data.len();
        if buf.len() < end {
            buf.resize(end, 0);
        }
        buf[start..end].copy_from_slice(data);
        self.position = end as u64;
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for SharedBufferWriter {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let buf = self.buffer.lock();
        let start = (self.position as usize).min(buf.len());
        let n = out.len().min(buf.len() - start);
        out[..n].copy_from_slice(&buf[start..start + n]);
        self.position += n as u64;
        Ok(n)
    }
}

impl Seek for SharedBufferWriter {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = self.buffer.lock().len() as i64;
        let target = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::End(offset) => len + offset,
            SeekFrom::Current(offset) => self.position as i64 + offset,
        };
        if target < 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "seek before start of buffer"));
        }
        self.position = target as u64;
        Ok(self.position)
    }
}
